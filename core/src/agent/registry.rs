use crate::error::{RegistryError, ToolError};
use crate::traits::{Tool, ToolSpec};
use std::collections::HashMap;
use std::sync::Arc;

/// The process-wide tool catalog. Tools are added while the registry is still
/// exclusively owned; once it is shared behind an `Arc` it is read-only.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateToolName(name));
        }

        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn describe_all(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.by_name
            .get(name)
            .map(|&idx| self.tools[idx].clone())
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{CalcOp, CalculatorTool};

    #[test]
    fn registry_rejects_duplicate_names() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(CalculatorTool::new(CalcOp::Add)))
            .unwrap();

        let err = registry
            .register(Arc::new(CalculatorTool::new(CalcOp::Add)))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateToolName("add".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_describes_in_registration_order() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(CalculatorTool::new(CalcOp::Multiply)))
            .unwrap();
        registry
            .register(Arc::new(CalculatorTool::new(CalcOp::Add)))
            .unwrap();

        let names: Vec<String> = registry.describe_all().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["multiply", "add"]);
    }

    #[test]
    fn registry_resolve_unknown() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        match registry.resolve("teleport") {
            Err(ToolError::UnknownTool(name)) => assert_eq!(name, "teleport"),
            _ => panic!("expected UnknownTool"),
        }
    }
}
