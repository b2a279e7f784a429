//! Inline cell editing.

use super::{DATA_EDIT_MODULE, FeatureModule, ModuleContext};
use crate::error::Result;
use crate::events::{GridEvent, GridRequest};

/// Applies a cell edit to the loaded page and forwards it to the edit endpoint.
#[derive(Debug, Default)]
pub struct DataEditModule;

impl DataEditModule {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureModule for DataEditModule {
    fn name(&self) -> &str {
        DATA_EDIT_MODULE
    }

    fn handle_event(&mut self, event: &GridEvent, ctx: &mut ModuleContext<'_>) -> Result<()> {
        if let GridEvent::CellEdited {
            row_id,
            field,
            value,
        } = event
        {
            let previous = ctx.grid.update_cell(row_id, field, value.clone())?;
            if previous.as_ref() == Some(value) {
                return Ok(());
            }
            ctx.request(GridRequest::NotifyCellEdited {
                row_id: row_id.clone(),
                field: field.clone(),
                value: value.clone(),
                previous,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::modules::test_support::Harness;
    use crate::types::RowId;
    use serde_json::json;

    fn harness(config: &GridConfig) -> Harness<'_> {
        let rows = vec![json!({"id": 1, "qty": 3}).as_object().cloned().unwrap()];
        Harness::new(config).with_rows(rows, 1, 1)
    }

    #[test]
    fn test_edit_updates_cell_and_notifies() {
        let config = GridConfig::new("orders", "/data/");
        let mut module = DataEditModule::new();
        let mut harness = harness(&config);
        let event = GridEvent::CellEdited {
            row_id: RowId::Int(1),
            field: "qty".into(),
            value: json!(7),
        };
        harness.apply(|ctx| module.handle_event(&event, ctx));
        assert_eq!(harness.grid.rows()[0]["qty"], json!(7));
        assert_eq!(
            harness.requests,
            vec![GridRequest::NotifyCellEdited {
                row_id: RowId::Int(1),
                field: "qty".into(),
                value: json!(7),
                previous: Some(json!(3)),
            }]
        );
    }

    #[test]
    fn test_unchanged_value_is_not_sent() {
        let config = GridConfig::new("orders", "/data/");
        let mut module = DataEditModule::new();
        let mut harness = harness(&config);
        let event = GridEvent::CellEdited {
            row_id: RowId::Int(1),
            field: "qty".into(),
            value: json!(3),
        };
        harness.apply(|ctx| module.handle_event(&event, ctx));
        assert!(harness.requests.is_empty());
    }

    #[test]
    fn test_edit_of_missing_row_fails() {
        let config = GridConfig::new("orders", "/data/");
        let mut module = DataEditModule::new();
        let mut harness = harness(&config);
        let event = GridEvent::CellEdited {
            row_id: RowId::Int(2),
            field: "qty".into(),
            value: json!(1),
        };
        assert!(harness.run(|ctx| module.handle_event(&event, ctx)).is_err());
    }
}
