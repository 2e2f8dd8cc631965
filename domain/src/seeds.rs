//! Fallback records used when the durable slot is empty or unreadable.

use crate::{Currency, Feature, PartnershipId, PartnershipRecord};

fn seed(
    id: &'static str,
    name: &str,
    portal_url: &str,
    features: &[Feature],
    item_fee_percent: f64,
    instant_billing: bool,
) -> PartnershipRecord {
    PartnershipRecord {
        id: PartnershipId(id.to_string()),
        name: name.to_string(),
        currency: Currency::Usd,
        portal_url: portal_url.to_string(),
        features: features.to_vec(),
        item_fee_percent,
        instant_billing,
        created_at: None,
        last_update: None,
    }
}

/// The two shipped example partnerships.
pub fn seed_partnerships() -> Vec<PartnershipRecord> {
    vec![
        seed(
            "6555e6ac2f08325dca9b5e6c",
            "Chooose Demo",
            "https://cdemo.test.portal.chooose.today",
            &[
                Feature::FlightsFromTo,
                Feature::FlightsByDistance,
                Feature::FlightsUpload,
                Feature::Carbon,
                Feature::EmissionsDashboard,
                Feature::EmissionCompensateFlights,
                Feature::EmissionCompensateAirFreight,
            ],
            15.0,
            false,
        ),
        seed(
            "682fa8c19340de8ea5338e8a",
            "Chooose SAF Demo",
            "https://safdemo.test.portal.chooose.today",
            &[
                Feature::EmissionsDashboard,
                Feature::EmissionCompensate,
                Feature::EmissionCompensateAirFreight,
            ],
            0.0,
            true,
        ),
    ]
}
