use serde::Serialize;

use crate::models::{DomainKind, TravelRequest};

const UNKNOWN_ORIGIN: &str = "their nearest major airport";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub fn system_instruction(kind: DomainKind) -> &'static str {
    match kind {
        DomainKind::Flights => {
            "Given an origin, destination, dates, and budget, suggest 2-3 flight options. \
             For each flight, provide a name, description, price estimate, and duration. \
             Respond in JSON format using the key 'flights' with a list of flight objects."
        }
        DomainKind::Lodging => {
            "Given a destination, dates, and budget, suggest 2-3 hotel options. \
             For each hotel, provide a name, a short description, price estimate, and amenities. \
             Respond in JSON format using the key 'hotels' or 'stays' with a list of hotel objects."
        }
        DomainKind::Activities => {
            "Given a destination, dates, and budget, suggest 2-3 engaging activities. \
             For each activity, provide a name, description, price estimate, and duration. \
             Respond in JSON format using the key 'activities' with a list of activity objects."
        }
    }
}

pub fn render_prompt(kind: DomainKind, request: &TravelRequest) -> Prompt {
    let destination = request.destination.trim();
    let budget = request.budget_label();

    let user = match kind {
        DomainKind::Flights => {
            let origin = request.origin().unwrap_or(UNKNOWN_ORIGIN);
            format!(
                "User wants flights from {origin} to {destination} from {} to {}, with a budget of {budget}. \
                 Suggest 2-3 flight options, each with name, description, price estimate, and duration. \
                 Respond in JSON format using the key 'flights' with a list of flight objects.",
                request.start_date, request.end_date
            )
        }
        DomainKind::Lodging => format!(
            "User is looking for hotels in {destination} from {} to {}, with a budget of {budget}. \
             Suggest 2-3 hotels, each with name, description, price estimate, and amenities. \
             Respond in JSON format using the key 'hotels' with a list of hotel objects.",
            request.start_date, request.end_date
        ),
        DomainKind::Activities => format!(
            "User is visiting {destination} from {} to {}, with a budget of {budget}. \
             Suggest 2-3 engaging activities, each with name, description, price estimate, and duration. \
             Respond in JSON format using the key 'activities' with a list of activity objects.",
            request.start_date, request.end_date
        ),
    };

    Prompt {
        system: system_instruction(kind).to_string(),
        user,
    }
}
