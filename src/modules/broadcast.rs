//! Module broadcaster.
//!
//! Runs one lifecycle action on every module and folds the results into a
//! single value. A module that returns an error or panics is logged and
//! skipped; its contribution is treated as absent and the remaining modules
//! still run.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{trace, warn};

use super::{
    AdvancedFilterModule, FeatureModule, FilterModule, GridModule, SavedViewsModule,
    SelectionModule,
};
use crate::error::{GridError, Result};
use crate::grid::GridOptions;
use crate::types::{ColumnSpec, ParamSlice};

/// How results from successive modules combine. The receiver is the
/// accumulated result of the modules that ran earlier.
pub trait Merge: Default {
    fn merge(self, later: Self) -> Self;
}

impl Merge for () {
    fn merge(self, _later: Self) -> Self {}
}

impl Merge for bool {
    fn merge(self, later: Self) -> Self {
        self || later
    }
}

impl<T> Merge for Vec<T> {
    fn merge(mut self, later: Self) -> Self {
        self.extend(later);
        self
    }
}

impl Merge for ParamSlice {
    /// Shallow merge where keys already present are kept.
    fn merge(mut self, later: Self) -> Self {
        for (key, value) in later {
            self.entry(key).or_insert(value);
        }
        self
    }
}

/// Turn a caught panic into the module fault it stands for.
fn panic_fault(module: &str, action: &'static str, payload: &(dyn Any + Send)) -> GridError {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    };
    GridError::Module {
        module: module.to_string(),
        action,
        message,
    }
}

/// The instantiated modules of one grid, in broadcast order.
pub struct ModuleSet {
    modules: Vec<GridModule>,
}

impl ModuleSet {
    /// Order modules by descending priority, keeping registration order on ties.
    pub fn new(mut modules: Vec<GridModule>) -> Self {
        modules.sort_by_key(|m| std::cmp::Reverse(m.priority()));
        Self { modules }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Run `f` on every module, isolating failures, and merge the results.
    pub fn invoke<T, F>(&mut self, action: &'static str, mut f: F) -> T
    where
        T: Merge,
        F: FnMut(&mut GridModule) -> Result<T>,
    {
        let mut merged: Option<T> = None;
        for module in &mut self.modules {
            let name = module.name().to_string();
            trace!(module = %name, action, "broadcast");
            match panic::catch_unwind(AssertUnwindSafe(|| f(module))) {
                Ok(Ok(value)) => {
                    merged = Some(match merged {
                        Some(acc) => acc.merge(value),
                        None => value,
                    });
                }
                Ok(Err(error)) => {
                    warn!(module = %name, action, error = %error, "module action failed");
                }
                Err(payload) => {
                    let fault = panic_fault(&name, action, payload.as_ref());
                    warn!(error = %fault, "module action panicked");
                }
            }
        }
        merged.unwrap_or_default()
    }

    /// Read-only variant of [`ModuleSet::invoke`].
    pub fn query<T, F>(&self, action: &'static str, f: F) -> T
    where
        T: Merge,
        F: Fn(&GridModule) -> Result<T>,
    {
        let mut merged: Option<T> = None;
        for module in &self.modules {
            match panic::catch_unwind(AssertUnwindSafe(|| f(module))) {
                Ok(Ok(value)) => {
                    merged = Some(match merged {
                        Some(acc) => acc.merge(value),
                        None => value,
                    });
                }
                Ok(Err(error)) => {
                    warn!(module = module.name(), action, error = %error, "module action failed");
                }
                Err(payload) => {
                    let fault = panic_fault(module.name(), action, payload.as_ref());
                    warn!(error = %fault, "module action panicked");
                }
            }
        }
        merged.unwrap_or_default()
    }

    /// Thread grid options through every module; a failing module leaves them unchanged.
    pub fn fold_options(&self, options: GridOptions) -> GridOptions {
        self.modules.iter().fold(options, |current, module| {
            let input = current.clone();
            match panic::catch_unwind(AssertUnwindSafe(|| module.modify_grid_options(input))) {
                Ok(Ok(modified)) => modified,
                Ok(Err(error)) => {
                    warn!(module = module.name(), error = %error, "modify_grid_options failed");
                    current
                }
                Err(payload) => {
                    let fault = panic_fault(module.name(), "modify_grid_options", payload.as_ref());
                    warn!(error = %fault, "module action panicked");
                    current
                }
            }
        })
    }

    pub fn leading_columns(&self, config: &crate::config::GridConfig) -> Vec<ColumnSpec> {
        self.query("before_default_columns", |m| m.before_default_columns(config))
    }

    pub fn filter_mut(&mut self) -> Option<&mut FilterModule> {
        self.modules.iter_mut().find_map(|m| match m {
            GridModule::Filter(filter) => Some(filter),
            _ => None,
        })
    }

    pub fn advanced_filter_mut(&mut self) -> Option<&mut AdvancedFilterModule> {
        self.modules.iter_mut().find_map(|m| match m {
            GridModule::AdvancedFilter(filter) => Some(filter),
            _ => None,
        })
    }

    pub fn selection(&self) -> Option<&SelectionModule> {
        self.modules.iter().find_map(|m| match m {
            GridModule::Selection(selection) => Some(selection),
            _ => None,
        })
    }

    pub fn saved_views(&self) -> Option<&SavedViewsModule> {
        self.modules.iter().find_map(|m| match m {
            GridModule::SavedViews(views) => Some(views),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GridError;
    use crate::config::GridConfig;
    use crate::modules::test_support::Harness;
    use crate::modules::{CustomModule, ModuleContext};
    use serde_json::json;

    struct Contributes {
        name: &'static str,
        priority: i32,
        params: serde_json::Value,
    }

    impl FeatureModule for Contributes {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn get_url_params(&self, _ctx: &ModuleContext<'_>) -> Result<ParamSlice> {
            Ok(self.params.as_object().cloned().unwrap_or_default())
        }

        fn requires_header(&self) -> Result<bool> {
            Ok(self.name == "b")
        }
    }

    struct Faulty {
        panics: bool,
    }

    impl FeatureModule for Faulty {
        fn name(&self) -> &str {
            "faulty"
        }

        fn get_url_params(&self, _ctx: &ModuleContext<'_>) -> Result<ParamSlice> {
            if self.panics {
                panic!("boom");
            }
            Err(GridError::Other("broken".into()))
        }

        fn requires_header(&self) -> Result<bool> {
            Err(GridError::Other("broken".into()))
        }
    }

    fn contributes(name: &'static str, priority: i32, params: serde_json::Value) -> GridModule {
        CustomModule::new(Contributes {
            name,
            priority,
            params,
        })
        .into()
    }

    fn params_of(set: &ModuleSet) -> ParamSlice {
        let config = GridConfig::new("orders", "/data/");
        let mut harness = Harness::new(&config);
        harness.run(|ctx| set.query("get_url_params", |m| m.get_url_params(&*ctx)))
    }

    #[test]
    fn test_earlier_module_wins_key_conflicts() {
        let set = ModuleSet::new(vec![
            contributes("a", 0, json!({"shared": "a", "onlyA": 1})),
            contributes("b", 0, json!({"shared": "b", "onlyB": 2})),
        ]);
        let params = params_of(&set);
        assert_eq!(params["shared"], json!("a"));
        assert_eq!(params["onlyA"], json!(1));
        assert_eq!(params["onlyB"], json!(2));
    }

    #[test]
    fn test_priority_overrides_registration_order() {
        let set = ModuleSet::new(vec![
            contributes("low", 0, json!({"shared": "low"})),
            contributes("high", 10, json!({"shared": "high"})),
        ]);
        assert_eq!(set.names(), vec!["high", "low"]);
        assert_eq!(params_of(&set)["shared"], json!("high"));
    }

    #[test]
    fn test_faulty_module_is_isolated() {
        for panics in [false, true] {
            let set = ModuleSet::new(vec![
                contributes("b", 0, json!({"b": 1})),
                CustomModule::new(Faulty { panics }).into(),
                contributes("c", 0, json!({"c": 2})),
            ]);
            let params = params_of(&set);
            assert_eq!(params.len(), 2);
            assert_eq!(params["b"], json!(1));
            assert_eq!(params["c"], json!(2));
        }
    }

    #[test]
    fn test_booleans_are_ored_across_failures() {
        let set = ModuleSet::new(vec![
            CustomModule::new(Faulty { panics: false }).into(),
            contributes("a", 0, json!({})),
            contributes("b", 0, json!({})),
        ]);
        assert!(set.query("requires_header", |m| m.requires_header()));
    }

    #[test]
    fn test_vectors_concatenate() {
        assert_eq!(vec![1, 2].merge(vec![3]), vec![1, 2, 3]);
        assert!(!false.merge(false));
    }
}
