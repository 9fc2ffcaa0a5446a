//! Hand-authored sample content served when live data is unobtainable,
//! so presentation layers always receive a well-shaped response. Every
//! read built from this module is tagged `Provenance::Sample`.

use serde_json::{json, Value};

use crate::tables;
use crate::types::Record;

/// Fixed substitute rows for one table. Non-empty for every table the
/// site renders; empty for anything unknown.
pub fn sample_records(table: &str) -> Vec<Record> {
    match table {
        tables::PEOPLE => vec![
            sample(
                "recSamplePerson01",
                json!({
                    "Name": "Dr. Amara Okafor",
                    "Role": "Commission Co-chair",
                    "Affiliation": "Institute for Global Health Policy",
                    "Short bio": "Epidemiologist focused on health-system resilience in low-resource settings.",
                    "Order": 1
                }),
            ),
            sample(
                "recSamplePerson02",
                json!({
                    "Name": "Prof. Lars Eriksen",
                    "Role": "Commissioner",
                    "Affiliation": "Centre for Population Health Research",
                    "Short bio": "Health economist studying the long-run costs of delayed public-health investment.",
                    "Order": 2
                }),
            ),
            sample(
                "recSamplePerson03",
                json!({
                    "Name": "Dr. Mei-Ling Chen",
                    "Role": "Research Lead",
                    "Affiliation": "School of Public Health",
                    "Short bio": "Leads the evidence-synthesis workstream and the case study programme.",
                    "Order": 3
                }),
            ),
        ],
        tables::CASE_STUDIES => vec![
            sample(
                "recSampleCase01",
                json!({
                    "Title": "Community-led vaccination outreach",
                    "Country": "Kenya",
                    "Summary": "How county health teams doubled coverage by pairing clinics with community health volunteers.",
                    "Themes": ["Primary care", "Community engagement"],
                    "Status": "Published"
                }),
            ),
            sample(
                "recSampleCase02",
                json!({
                    "Title": "Wastewater surveillance at city scale",
                    "Country": "Netherlands",
                    "Summary": "A national early-warning network built on existing sanitation infrastructure.",
                    "Themes": ["Surveillance", "Data systems"],
                    "Status": "Published"
                }),
            ),
        ],
        tables::LANDSCAPE_TOPICS => vec![
            sample(
                "recSampleTopic01",
                json!({
                    "Topic": "Financing public-health functions",
                    "Summary": "Where core capabilities are funded, and where the gaps sit.",
                    "Order": 1
                }),
            ),
            sample(
                "recSampleTopic02",
                json!({
                    "Topic": "Workforce and training",
                    "Summary": "The pipeline of field epidemiologists and community health workers.",
                    "Order": 2
                }),
            ),
        ],
        tables::BIBLIOGRAPHY => vec![
            sample(
                "recSamplePaper01",
                json!({
                    "Title": "Rebuilding trust in public health institutions",
                    "Authors": ["Okafor A", "Eriksen L"],
                    "Year": 2024,
                    "Journal": "The Lancet Public Health",
                    "URL": "https://example.org/papers/rebuilding-trust"
                }),
            ),
            sample(
                "recSamplePaper02",
                json!({
                    "Title": "What counts as a core public health function?",
                    "Authors": ["Chen M-L"],
                    "Year": 2023,
                    "Journal": "BMJ Global Health",
                    "URL": "https://example.org/papers/core-functions"
                }),
            ),
        ],
        tables::METRICS => vec![
            sample(
                "recSampleMetric01",
                json!({
                    "Name": "Countries reviewed",
                    "Value": 42,
                    "Unit": "countries"
                }),
            ),
            sample(
                "recSampleMetric02",
                json!({
                    "Name": "Case studies collected",
                    "Value": 18,
                    "Unit": "studies"
                }),
            ),
            sample(
                "recSampleMetric03",
                json!({
                    "Name": "Commissioners",
                    "Value": 23,
                    "Unit": "people"
                }),
            ),
        ],
        _ => Vec::new(),
    }
}

fn sample(id: &str, fields: Value) -> Record {
    let fields = match fields {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    Record::from_raw(id.to_string(), fields)
}
