//! Test data builders for creating test objects

use asset_signal_server::{Asset, Signal, SignalValue};

/// Builder for creating test Assets
pub struct AssetBuilder {
    name: String,
    signals: Vec<(String, SignalValue)>,
}

impl AssetBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            signals: Vec::new(),
        }
    }

    pub fn signal(mut self, name: &str, value: SignalValue) -> Self {
        self.signals.push((name.to_string(), value));
        self
    }

    pub fn double(self, name: &str, value: f64) -> Self {
        self.signal(name, SignalValue::Double(value))
    }

    pub fn integer(self, name: &str, value: i32) -> Self {
        self.signal(name, SignalValue::Integer(value))
    }

    pub fn boolean(self, name: &str, value: bool) -> Self {
        self.signal(name, SignalValue::Boolean(value))
    }

    pub fn text(self, name: &str, value: &str) -> Self {
        self.signal(name, SignalValue::String(value.to_string()))
    }

    /// Build the asset; duplicate signal names keep the first
    pub fn build(self) -> Asset {
        let mut asset = Asset::new(self.name).unwrap();
        for (name, value) in self.signals {
            let _ = asset.add_signal(Signal::with_value(name, value).unwrap());
        }
        asset
    }
}

/// A welder, a conveyor and a press covering all four signal types
pub fn plant() -> Vec<Asset> {
    vec![
        AssetBuilder::new("RoboticWelder_01")
            .double("Current", 152.5)
            .boolean("ArcOn", false)
            .text("Mode", "Auto")
            .build(),
        AssetBuilder::new("Conveyor_01")
            .double("Speed", 1.25)
            .integer("ItemCount", 0)
            .build(),
        AssetBuilder::new("HydraulicPress_01")
            .double("Pressure", 87.3)
            .integer("StrokeCount", 42)
            .text("Status", "Idle")
            .build(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_builder() {
        let asset = AssetBuilder::new("Pump_01")
            .double("Flow", 12.5)
            .integer("Flow", 3)
            .build();

        assert_eq!(asset.name(), "Pump_01");
        assert_eq!(asset.signal_count(), 1);
        assert_eq!(
            asset.get_signal("Flow").unwrap().value(),
            SignalValue::Double(12.5)
        );
    }
}
