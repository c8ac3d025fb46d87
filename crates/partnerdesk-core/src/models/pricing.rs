use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    #[serde(rename = "type")]
    pub plan_type: String,
    pub name: String,
    #[serde(default)]
    pub duration_days: u32,
    pub price: f64,
    #[serde(default)]
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModulePlan {
    #[serde(rename = "type")]
    pub module_type: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
}

impl ModulePlan {
    /// Name without the parenthesized suffix the backend appends, e.g. "Inventory (Pro)".
    pub fn short_name(&self) -> &str {
        self.name.split('(').next().unwrap_or(&self.name).trim()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleBundle {
    pub code: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// Public price list from `GET /pricing`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default)]
    pub plans: Vec<SubscriptionPlan>,
    #[serde(default)]
    pub modules: Vec<ModulePlan>,
    #[serde(default)]
    pub bundles: Vec<ModuleBundle>,
}

impl Pricing {
    pub fn plan(&self, plan_type: &str) -> Option<&SubscriptionPlan> {
        self.plans.iter().find(|p| p.plan_type.eq_ignore_ascii_case(plan_type))
    }

    pub fn module(&self, module_type: &str) -> Option<&ModulePlan> {
        self.modules.iter().find(|m| m.module_type.eq_ignore_ascii_case(module_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pricing() {
        let json = r#"{
            "plans": [{"type": "MONTHLY", "name": "Monthly", "duration_days": 30, "price": 15000, "currency": "NGN"}],
            "modules": [{"type": "INVENTORY", "name": "Inventory (Advanced)", "price": 5000, "description": "Stock control"}],
            "bundles": [{"code": "GROWTH", "name": "Growth", "price": 12000, "modules": ["INVENTORY", "CRM"], "description": ""}]
        }"#;
        let pricing: Pricing = serde_json::from_str(json).expect("pricing");
        assert_eq!(pricing.plan("monthly").map(|p| p.duration_days), Some(30));
        assert_eq!(pricing.module("INVENTORY").map(|m| m.short_name()), Some("Inventory"));
        assert_eq!(pricing.bundles[0].modules.len(), 2);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let pricing: Pricing = serde_json::from_str(r#"{"plans": []}"#).expect("pricing");
        assert!(pricing.modules.is_empty());
        assert!(pricing.bundles.is_empty());
    }
}
