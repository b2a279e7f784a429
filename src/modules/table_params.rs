//! Paging and sorting state, plus the pagination widget model.

use serde::Serialize;
use serde_json::{Value, json};

use super::{FeatureModule, ModuleContext, TABLE_PARAMS_MODULE};
use crate::config::Translations;
use crate::error::Result;
use crate::events::{GridEvent, GridNotification};
use crate::types::{ParamSlice, SortSpec, TableState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageButton {
    Prev { disabled: bool },
    Page { number: u32, active: bool },
    /// Non-clickable gap between page numbers.
    Ellipsis,
    Next { disabled: bool },
}

/// Rendered state of the pagination widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationView {
    /// "11-20 of 95" style summary, or the empty-page text.
    pub text: String,
    /// Empty when everything fits on one page.
    pub buttons: Vec<PageButton>,
}

/// Inputs of [`pagination_view`], read off the grid after a page is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub page_max: u32,
    pub page_size: u32,
    /// Rows on the loaded page.
    pub data_count: u64,
    pub total: u64,
}

pub fn pagination_view(window: PageWindow, active_range: u32, translations: &Translations) -> PaginationView {
    let PageWindow {
        page,
        page_max,
        page_size,
        data_count,
        total,
    } = window;
    let size = u64::from(page_size);
    let offset = size * u64::from(page.saturating_sub(1));

    let text = if data_count > 0 {
        let from = offset + 1;
        let to = if size == data_count {
            size * u64::from(page)
        } else {
            offset + data_count
        };
        translations
            .page
            .replace("${from}", &from.to_string())
            .replace("${to}", &to.to_string())
            .replace("${total}", &total.to_string())
    } else {
        translations.page_empty.clone()
    };

    if page_max <= 1 {
        return PaginationView {
            text,
            buttons: Vec::new(),
        };
    }

    let range = active_range.max(1);
    let numbered = |numbers: &mut dyn Iterator<Item = u32>, out: &mut Vec<PageButton>| {
        out.extend(numbers.map(|number| PageButton::Page {
            number,
            active: number == page,
        }));
    };

    let mut buttons = vec![PageButton::Prev {
        disabled: page == 1,
    }];
    if page_max > range + 1 {
        if page >= range {
            buttons.push(PageButton::Page {
                number: 1,
                active: false,
            });
            buttons.push(PageButton::Ellipsis);
            if page > page_max - range + 1 {
                numbered(&mut (page_max - range + 1..=page_max), &mut buttons);
            } else {
                let first = page - range / 2;
                numbered(&mut (first..first + range), &mut buttons);
                buttons.push(PageButton::Ellipsis);
                buttons.push(PageButton::Page {
                    number: page_max,
                    active: false,
                });
            }
        } else {
            numbered(&mut (1..=range), &mut buttons);
            buttons.push(PageButton::Ellipsis);
            buttons.push(PageButton::Page {
                number: page_max,
                active: false,
            });
        }
    } else {
        numbered(&mut (1..=page_max), &mut buttons);
    }
    buttons.push(PageButton::Next {
        disabled: page == page_max,
    });

    PaginationView { text, buttons }
}

#[derive(Debug, Default)]
pub struct TableParamsModule;

impl TableParamsModule {
    pub fn new() -> Self {
        Self
    }

    fn publish_widgets(ctx: &mut ModuleContext<'_>) {
        let window = PageWindow {
            page: ctx.grid.page(),
            page_max: ctx.grid.page_max(),
            page_size: ctx.grid.page_size(),
            data_count: ctx.grid.data_count() as u64,
            total: ctx.grid.remote_row_count(),
        };
        let view = pagination_view(
            window,
            ctx.constants().pagination_active_range,
            &ctx.config.translations,
        );
        let options = ctx.constants().page_size_options.clone();
        let current = ctx.grid.page_size();
        ctx.notify(GridNotification::Pagination(view));
        ctx.notify(GridNotification::PageSize { current, options });
    }

    fn table_params(&self, ctx: &ModuleContext<'_>) -> ParamSlice {
        let c = ctx.constants();
        let defaults = &ctx.defaults.table;
        let last = ctx
            .last_table_params
            .cloned()
            .unwrap_or_else(|| ctx.grid.table_state());

        let mut table = ParamSlice::new();
        if last.size != defaults.size {
            table.insert(c.table_params_size_name.clone(), json!(last.size));
        }
        if last.page != defaults.page {
            table.insert(c.table_params_page_name.clone(), json!(last.page));
        }
        if !last.sort.is_empty() && last.sort != defaults.sort {
            table.insert(
                c.table_params_sort_name.clone(),
                SortSpec::list_to_value(&last.sort),
            );
        }
        table
    }
}

impl FeatureModule for TableParamsModule {
    fn name(&self) -> &str {
        TABLE_PARAMS_MODULE
    }

    fn load_from_url(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        let c = ctx.constants();
        let defaults = &ctx.defaults.table;
        let url = ctx.url_object(&c.table_params_name);
        let positive = |key: &str| -> Option<u32> {
            url.and_then(|t| t.get(key))
                .and_then(Value::as_u64)
                .filter(|n| *n > 0)
                .and_then(|n| u32::try_from(n).ok())
        };

        let sort = url
            .and_then(|t| t.get(&c.table_params_sort_name))
            .map(SortSpec::list_from_value)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| defaults.sort.clone());
        let state = TableState {
            page: positive(&c.table_params_page_name).unwrap_or(defaults.page),
            size: positive(&c.table_params_size_name).unwrap_or(defaults.size),
            sort,
        };
        ctx.grid.restore_state(state);
        Ok(())
    }

    fn load_from_url_after_init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        Self::publish_widgets(ctx);
        Ok(())
    }

    fn get_url_params(&self, ctx: &ModuleContext<'_>) -> Result<ParamSlice> {
        let mut params = ParamSlice::new();
        let table = self.table_params(ctx);
        if !table.is_empty() {
            params.insert(ctx.constants().table_params_name.clone(), Value::Object(table));
        }
        Ok(params)
    }

    fn get_url_params_for_save(&self, ctx: &ModuleContext<'_>) -> Result<ParamSlice> {
        let c = ctx.constants();
        let mut params = ParamSlice::new();
        let mut table = self.table_params(ctx);
        table.remove(&c.table_params_page_name);
        if !table.is_empty() {
            params.insert(c.table_params_name.clone(), Value::Object(table));
        }
        Ok(params)
    }

    fn on_data_processed(&mut self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        Self::publish_widgets(ctx);
        Ok(())
    }

    fn handle_event(&mut self, event: &GridEvent, ctx: &mut ModuleContext<'_>) -> Result<()> {
        match event {
            GridEvent::PageChanged(page) => ctx.grid.set_page(*page),
            GridEvent::PageSizeChanged(size) => ctx.grid.set_page_size(*size),
            GridEvent::SortChanged(sort) => ctx.grid.set_sort(sort.clone()),
            _ => {}
        }
        Ok(())
    }
}
