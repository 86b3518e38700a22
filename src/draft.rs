//! Pre-submission record drafts and their conversion into records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ToolError};
use crate::model::{
    AccessoryItem, Condition, FuelType, PricingRateRange, PricingTable, PricingTerm, RecordId,
    TireLabel, TireOption, Transmission, VehicleInfo, VehicleRecord, Visibility,
};
use crate::schema;

/// Source of opaque unique identifiers.
pub trait IdGenerator {
    fn next_id(&mut self) -> RecordId;
}

/// Random UUID v4 identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> RecordId {
        Uuid::new_v4().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessoryDraft {
    pub name: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TireDraft {
    pub label: TireLabel,
    #[serde(default)]
    pub price: String,
}

/// Everything the user has entered for a vehicle that is not yet part of the
/// working list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordDraft {
    pub vehicle: VehicleInfo,
    pub pricing: PricingTable,
    pub accessories: Vec<AccessoryDraft>,
    pub tires: Vec<TireDraft>,
}

impl RecordDraft {
    /// Labels of required fields that are still blank, in form order.
    pub fn missing_required(&self) -> Vec<String> {
        let values: Vec<(&str, &str)> = self.vehicle.fields().collect();
        schema::REQUIRED_FIELDS
            .iter()
            .filter(|(field, _)| {
                values
                    .iter()
                    .find(|(name, _)| name == field)
                    .is_none_or(|(_, value)| value.trim().is_empty())
            })
            .map(|(_, label)| label.to_string())
            .collect()
    }

    /// Validates the draft and assigns fresh identifiers to the record and
    /// every child item. Accessories with a blank name are dropped.
    pub fn into_record(self, ids: &mut dyn IdGenerator) -> Result<VehicleRecord> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(ToolError::MissingRequiredFields(missing));
        }
        self.pricing.validate()?;

        let id = ids.next_id();
        let accessories = self
            .accessories
            .into_iter()
            .filter(|draft| !draft.name.trim().is_empty())
            .map(|draft| AccessoryItem {
                id: ids.next_id(),
                name: draft.name,
                price: draft.price,
            })
            .collect();
        let tires = self
            .tires
            .into_iter()
            .map(|draft| TireOption {
                id: ids.next_id(),
                label: draft.label,
                price: draft.price,
            })
            .collect();

        Ok(VehicleRecord {
            id,
            vehicle: self.vehicle,
            pricing: self.pricing,
            accessories,
            tires,
        })
    }

    /// Fully populated example vehicle used to prefill a new draft.
    pub fn sample() -> Self {
        let vehicle = VehicleInfo {
            brand: "Peugeot".into(),
            model: "208".into(),
            trim: "Style".into(),
            condition: Some(Condition::Km0),
            category: "city_car".into(),
            registration_date: "2024-12-01".into(),
            kilometers: "1".into(),
            url: "https://example.com/peugeot-208-style-km0".into(),
            configuration_url: "https://example.com/peugeot-208-style-km0/configuration".into(),
            engine_size: "1199".into(),
            fuel_type: Some(FuelType::Benzina),
            transmission: Some(Transmission::Manual),
            power_kw: "55".into(),
            power_cv: "75".into(),
            seats: "5".into(),
            doors: "5".into(),
            status: "available".into(),
            visibility: Some(Visibility::VisibleOrderable),
            images: String::new(),
            exterior_color: "Bianco".into(),
            interior_color: "Tessuto nero".into(),
            wheels: "Cerchi in lega 16\"".into(),
            pair_to_save_daily: "10.00".into(),
            standard_equipment: "Radio DAB\nClimatizzatore automatico\nSensori pioggia".into(),
        };

        let pricing = PricingTable {
            short: sample_term(
                ["520.00", "15000.00", "20000.00", "3000.00", "6000.00"],
                &[("550.00", "200.00"), ("520.00", "190.00"), ("490.00", "180.00")],
            ),
            medium: sample_term(
                ["410.00", "14000.00", "19000.00", "2500.00", "5500.00"],
                &[
                    ("440.00", "195.00"),
                    ("420.00", "185.00"),
                    ("380.00", "175.00"),
                    ("340.00", "165.00"),
                ],
            ),
            long: sample_term(
                ["360.00", "13000.00", "18500.00", "2000.00", "5000.00"],
                &[
                    ("400.00", "160.00"),
                    ("360.00", "150.00"),
                    ("320.00", "145.00"),
                    ("300.00", "140.00"),
                    ("280.00", "135.00"),
                ],
            ),
        };

        let accessories = [
            ("Infotainment (media display)", "300.00"),
            ("Gancio traino", "440.00"),
            ("Telecamera di retromarcia", "165.00"),
        ]
        .into_iter()
        .map(|(name, price)| AccessoryDraft {
            name: name.into(),
            price: price.into(),
        })
        .collect();

        let tires = vec![
            TireDraft {
                label: TireLabel::AllSeason,
                price: "22.23".into(),
            },
            TireDraft {
                label: TireLabel::SummerWinter,
                price: "31.95".into(),
            },
        ];

        Self {
            vehicle,
            pricing,
            accessories,
            tires,
        }
    }
}

fn sample_term(scalars: [&str; 5], rates: &[(&str, &str)]) -> PricingTerm {
    let [monthly_avg, final_min, final_max, down_min, down_max] = scalars.map(str::to_string);
    PricingTerm {
        monthly_avg,
        final_min,
        final_max,
        down_min,
        down_max,
        rates: rates
            .iter()
            .enumerate()
            .map(|(index, (min, max))| PricingRateRange {
                min: min.to_string(),
                max: max.to_string(),
                ..PricingRateRange::blank(index + 1)
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sequential(usize);

    impl IdGenerator for Sequential {
        fn next_id(&mut self) -> RecordId {
            self.0 += 1;
            format!("id-{}", self.0)
        }
    }

    #[test]
    fn sample_draft_builds_a_valid_record() {
        let record = RecordDraft::sample()
            .into_record(&mut Sequential(0))
            .expect("sample is valid");
        assert_eq!(record.id, "id-1");
        assert_eq!(record.accessories.len(), 3);
        assert_eq!(record.accessories[0].id, "id-2");
        assert_eq!(record.tires[0].id, "id-5");
        assert_eq!(record.tires[1].id, "id-6");
        assert_eq!(record.pricing.long.rates[4].min, "280.00");
        assert_eq!(record.pricing.long.rates[4].label, "rate_5");
    }

    #[test]
    fn missing_required_fields_are_listed_in_form_order() {
        let mut draft = RecordDraft::default();
        draft.vehicle.model = "Clio".into();
        draft.vehicle.trim = "   ".into();

        match draft.into_record(&mut Sequential(0)) {
            Err(ToolError::MissingRequiredFields(fields)) => {
                assert_eq!(fields, vec!["Brand".to_string(), "Trim".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn malformed_pricing_is_rejected_at_construction() {
        let mut draft = RecordDraft::sample();
        draft.pricing.short.rates.push(PricingRateRange::blank(4));
        assert!(matches!(
            draft.into_record(&mut Sequential(0)),
            Err(ToolError::MalformedPricing { expected: 3, found: 4, .. })
        ));
    }

    #[test]
    fn blank_accessory_drafts_are_dropped() {
        let mut draft = RecordDraft::sample();
        draft.accessories.insert(
            1,
            AccessoryDraft {
                name: "  ".into(),
                price: "5".into(),
            },
        );
        let record = draft.into_record(&mut Sequential(0)).expect("valid draft");
        let names: Vec<&str> = record.accessories.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Infotainment (media display)",
                "Gancio traino",
                "Telecamera di retromarcia"
            ]
        );
    }

    #[test]
    fn uuid_generator_yields_distinct_ids() {
        let mut ids = UuidGenerator;
        assert_ne!(ids.next_id(), ids.next_id());
    }

    #[test]
    fn drafts_parse_from_partial_json() {
        let draft: RecordDraft = serde_json::from_value(serde_json::json!({
            "vehicle": { "brand": "Fiat", "model": "Panda", "trim": "Cross" },
            "accessories": [{ "name": "Roof bars", "price": "120" }],
            "tires": [{ "label": "winter" }]
        }))
        .expect("draft parsed");
        assert_eq!(draft.pricing, PricingTable::empty());
        assert_eq!(draft.tires[0].price, "");
    }
}
