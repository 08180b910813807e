use std::fmt::Write as _;

use crate::models::{CombinedPlan, DomainKind, ExtractionResult, RecommendationRecord};

const MISSING: &str = "N/A";

pub fn empty_message(kind: DomainKind) -> &'static str {
    match kind {
        DomainKind::Flights => "No flights found.",
        DomainKind::Lodging => "No stays found.",
        DomainKind::Activities => "No activities found.",
    }
}

pub fn heading(kind: DomainKind) -> &'static str {
    match kind {
        DomainKind::Flights => "Flights",
        DomainKind::Lodging => "Stays",
        DomainKind::Activities => "Activities",
    }
}

fn unknown_name(kind: DomainKind) -> &'static str {
    match kind {
        DomainKind::Flights => "Unknown Flight",
        DomainKind::Lodging => "Unknown Hotel",
        DomainKind::Activities => "Unknown Activity",
    }
}

pub fn format(result: &ExtractionResult, kind: DomainKind) -> String {
    let mut out = String::new();

    for record in result.records() {
        match record {
            RecommendationRecord::Flight(flight) if kind == DomainKind::Flights => {
                push_entry(
                    &mut out,
                    kind,
                    flight.name.as_deref(),
                    flight.description.as_deref(),
                    flight.price_estimate.as_deref(),
                );
                let _ = writeln!(
                    out,
                    "Duration: {} hours\n\n---",
                    flight.duration.as_deref().unwrap_or(MISSING)
                );
            }
            RecommendationRecord::Lodging(option) if kind == DomainKind::Lodging => {
                push_entry(
                    &mut out,
                    kind,
                    option.name.as_deref(),
                    option.description.as_deref(),
                    option.price_estimate.as_deref(),
                );
                let _ = writeln!(
                    out,
                    "Amenities: {}\n\n---",
                    option.amenities.as_deref().unwrap_or(MISSING)
                );
            }
            RecommendationRecord::Activity(activity) if kind == DomainKind::Activities => {
                push_entry(
                    &mut out,
                    kind,
                    activity.name.as_deref(),
                    activity.description.as_deref(),
                    activity.price_estimate.as_deref(),
                );
                let _ = writeln!(
                    out,
                    "Duration: {} hours\n\n---",
                    activity.duration.as_deref().unwrap_or(MISSING)
                );
            }
            _ => {}
        }
    }

    if out.is_empty() {
        empty_message(kind).to_string()
    } else {
        out
    }
}

fn push_entry(
    out: &mut String,
    kind: DomainKind,
    name: Option<&str>,
    description: Option<&str>,
    price: Option<&str>,
) {
    let _ = write!(
        out,
        "**{}**\n\n{}\n\nPrice: ${}\n",
        name.unwrap_or(unknown_name(kind)),
        description.unwrap_or_default(),
        price.map(|value| value.trim_start_matches('$')).unwrap_or(MISSING)
    );
}

pub fn format_plan(plan: &CombinedPlan) -> String {
    DomainKind::ALL
        .iter()
        .map(|kind| format!("## {}\n\n{}", heading(*kind), format(plan.slot(*kind), *kind)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, Flight, LodgingOption};

    #[test]
    fn formats_flights_like_the_planner_ui() {
        let result = ExtractionResult::from_records(vec![RecommendationRecord::Flight(Flight {
            name: Some("Air France AF23".to_string()),
            description: Some("Nonstop from JFK".to_string()),
            price_estimate: Some("640".to_string()),
            duration: Some("7.5".to_string()),
        })]);

        assert_eq!(
            format(&result, DomainKind::Flights),
            "**Air France AF23**\n\nNonstop from JFK\n\nPrice: $640\nDuration: 7.5 hours\n\n---\n"
        );
    }

    #[test]
    fn missing_fields_render_placeholders() {
        let stays = ExtractionResult::from_records(vec![RecommendationRecord::Lodging(
            LodgingOption::default(),
        )]);
        assert_eq!(
            format(&stays, DomainKind::Lodging),
            "**Unknown Hotel**\n\n\n\nPrice: $N/A\nAmenities: N/A\n\n---\n"
        );

        let activities = ExtractionResult::from_records(vec![RecommendationRecord::Activity(
            Activity {
                price_estimate: Some("$25".to_string()),
                ..Activity::default()
            },
        )]);
        let text = format(&activities, DomainKind::Activities);
        assert!(text.starts_with("**Unknown Activity**"));
        assert!(text.contains("Price: $25\n"));
        assert!(text.contains("Duration: N/A hours"));
    }

    #[test]
    fn empty_slots_render_messages() {
        assert_eq!(format(&ExtractionResult::Empty, DomainKind::Flights), "No flights found.");
        assert_eq!(format(&ExtractionResult::Empty, DomainKind::Lodging), "No stays found.");

        let plan = format_plan(&CombinedPlan::default());
        assert!(plan.contains("## Activities\n\nNo activities found."));
    }
}
