// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Function Registry
//!
//! This module provides the function registry for looking up and managing
//! SQL functions (scalar and aggregate). Names are case-insensitive.

use std::sync::{Arc, OnceLock};

use log::debug;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::aggregate;
use super::scalar;
use super::{
    AggregateFunction, AggregateOptions, AggregateResolution, ArgType, FunctionInfo, PlanContext,
    Resolution, ScalarFunction,
};
use crate::core::{Error, Result};

/// Global function registry instance
static GLOBAL_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// Get the global function registry
#[inline]
pub fn global_registry() -> &'static FunctionRegistry {
    GLOBAL_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Function registry for SQL functions
pub struct FunctionRegistry {
    /// Scalar functions
    scalar_functions: RwLock<FxHashMap<String, Arc<dyn ScalarFunction>>>,
    /// Aggregate functions
    aggregate_functions: RwLock<FxHashMap<String, Arc<dyn AggregateFunction>>>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// Create a new function registry with all built-in functions registered
    pub fn new() -> Self {
        let registry = Self::empty();
        scalar::register_builtins(&registry);
        aggregate::register_builtins(&registry);
        debug!(
            "function registry initialized with {} scalar and {} aggregate functions",
            registry.scalar_functions.read().len(),
            registry.aggregate_functions.read().len()
        );
        registry
    }

    /// Registry without any functions
    pub fn empty() -> Self {
        Self {
            scalar_functions: RwLock::new(FxHashMap::default()),
            aggregate_functions: RwLock::new(FxHashMap::default()),
        }
    }

    /// Register a scalar function under its own name, replacing any
    /// earlier function of that name
    pub fn register_scalar(&self, function: Arc<dyn ScalarFunction>) {
        let name = function.name().to_uppercase();
        self.scalar_functions.write().insert(name, function);
    }

    /// Register a scalar function under an additional name
    pub fn register_alias(&self, alias: &str, function: Arc<dyn ScalarFunction>) {
        self.scalar_functions
            .write()
            .insert(alias.to_uppercase(), function);
    }

    /// Register an aggregate function
    pub fn register_aggregate(&self, function: Arc<dyn AggregateFunction>) {
        let name = function.name().to_uppercase();
        self.aggregate_functions.write().insert(name, function);
    }

    /// Get a scalar function by name
    pub fn get_scalar(&self, name: &str) -> Option<Arc<dyn ScalarFunction>> {
        let funcs = self.scalar_functions.read();
        if let Some(f) = funcs.get(name) {
            return Some(f.clone());
        }
        funcs.get(&name.to_uppercase()).cloned()
    }

    /// Get an aggregate function by name
    pub fn get_aggregate(&self, name: &str) -> Option<Arc<dyn AggregateFunction>> {
        let funcs = self.aggregate_functions.read();
        if let Some(f) = funcs.get(name) {
            return Some(f.clone());
        }
        funcs.get(&name.to_uppercase()).cloned()
    }

    /// Resolve a scalar call. Unknown names fail with error 1305.
    pub fn resolve_scalar(
        &self,
        name: &str,
        args: &[ArgType],
        plan: &PlanContext,
    ) -> Result<Resolution> {
        let function = self
            .get_scalar(name)
            .ok_or_else(|| Error::FunctionNotExists(name.to_string()))?;
        let resolution = function.resolve(args, plan)?;
        debug!(
            "resolved {}({}) -> {}",
            name,
            args.iter()
                .map(|a| a.ty.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            resolution.return_type
        );
        Ok(resolution)
    }

    /// Resolve an aggregate call
    pub fn resolve_aggregate(
        &self,
        name: &str,
        args: &[ArgType],
        options: &AggregateOptions,
        plan: &PlanContext,
    ) -> Result<AggregateResolution> {
        let function = self
            .get_aggregate(name)
            .ok_or_else(|| Error::FunctionNotExists(name.to_string()))?;
        let resolution = function.resolve(args, options, plan)?;
        debug!("resolved aggregate {} -> {}", name, resolution.return_type);
        Ok(resolution)
    }

    /// Check if a function name is an aggregate function
    pub fn is_aggregate(&self, name: &str) -> bool {
        self.get_aggregate(name).is_some()
    }

    /// Check if a function name is a scalar function
    pub fn is_scalar(&self, name: &str) -> bool {
        self.get_scalar(name).is_some()
    }

    /// Check if a function exists
    pub fn exists(&self, name: &str) -> bool {
        self.is_scalar(name) || self.is_aggregate(name)
    }

    /// Get function info by name
    pub fn get_info(&self, name: &str) -> Option<FunctionInfo> {
        self.get_scalar(name)
            .map(|f| f.info())
            .or_else(|| self.get_aggregate(name).map(|f| f.info()))
    }

    /// List all scalar function names
    pub fn list_scalars(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scalar_functions.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// List all aggregate function names
    pub fn list_aggregates(&self) -> Vec<String> {
        let mut names: Vec<String> = self.aggregate_functions.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// List all function names
    pub fn list_all(&self) -> Vec<String> {
        let mut names = self.list_scalars();
        names.extend(self.list_aggregates());
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Datum, FieldType};
    use crate::functions::{FunctionType, PlanContext};

    #[test]
    fn test_registry_new() {
        let registry = FunctionRegistry::new();
        assert!(registry.is_aggregate("COUNT"));
        assert!(registry.is_aggregate("SUM"));
        assert!(registry.is_aggregate("GROUP_CONCAT"));
        assert!(registry.is_scalar("CONCAT"));
        assert!(registry.is_scalar("DATE_ADD"));
        assert!(registry.list_scalars().len() > 200);
    }

    #[test]
    fn test_registry_case_insensitive() {
        let registry = FunctionRegistry::new();
        assert!(registry.is_aggregate("count"));
        assert!(registry.is_scalar("Upper"));
        assert!(registry.is_scalar("date_format"));
    }

    #[test]
    fn test_unknown_function() {
        let registry = FunctionRegistry::new();
        let err = registry
            .resolve_scalar("NO_SUCH_FN", &[], &PlanContext::default())
            .unwrap_err();
        assert_eq!(err.code(), 1305);
        assert!(!registry.exists("NONEXISTENT"));
    }

    #[test]
    fn test_wrong_arity() {
        let registry = FunctionRegistry::new();
        let args = vec![
            ArgType::constant(Datum::Int(1), FieldType::long_long()),
            ArgType::constant(Datum::Int(2), FieldType::long_long()),
        ];
        let err = registry
            .resolve_scalar("ABS", &args, &PlanContext::default())
            .unwrap_err();
        assert_eq!(err.code(), 1582);
    }

    #[test]
    fn test_function_info() {
        let registry = FunctionRegistry::new();
        let info = registry.get_info("count").unwrap();
        assert_eq!(info.name, "COUNT");
        assert_eq!(info.function_type, FunctionType::Aggregate);
        let info = registry.get_info("abs").unwrap();
        assert_eq!(info.function_type, FunctionType::Scalar);
    }

    #[test]
    fn test_custom_registration() {
        let registry = FunctionRegistry::empty();
        assert!(!registry.is_scalar("ABS"));
        let abs = global_registry().get_scalar("ABS").unwrap();
        registry.register_alias("MY_ABS", abs);
        assert!(registry.is_scalar("my_abs"));
        assert_eq!(registry.list_all(), vec!["MY_ABS".to_string()]);
    }
}
