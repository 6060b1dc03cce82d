//! Prompts and Output Schemas
//!
//! One builder per remote operation. Each returns the instruction text and,
//! for structured calls, the output-shape constraint the model must follow.

use aegis_command_core::{Alert, Coordinates};
use aegis_command_llm::{ResponseSchema, StructuredRequest};

/// Kickoff turn that starts the spoken briefing.
pub const BRIEFING_KICKOFF: &str = "Begin the briefing.";

pub fn satellite_request(mime_type: &str, base64_data: &str) -> StructuredRequest {
    let schema = ResponseSchema::object()
        .property("disasterType", ResponseSchema::string())
        .property("riskLevel", ResponseSchema::string())
        .property("confidence", ResponseSchema::number())
        .property(
            "detectedAnomalies",
            ResponseSchema::array(ResponseSchema::string()),
        )
        .property("summary", ResponseSchema::string())
        .required([
            "disasterType",
            "riskLevel",
            "confidence",
            "detectedAnomalies",
            "summary",
        ]);

    StructuredRequest::text(
        "Analyze this satellite image for natural disasters. Identify the type of disaster \
         (Wildfire, Flood, Earthquake, Hurricane, or None), the risk level (Low, Medium, High, \
         Critical), confidence score (0-1), a list of detected anomalies, and a technical \
         summary. Return the response as JSON.",
        schema,
    )
    .with_inline_data(mime_type, base64_data)
}

pub fn logistics_request(alert: &Alert) -> StructuredRequest {
    let zone = ResponseSchema::object()
        .property("name", ResponseSchema::string())
        .property("capacity", ResponseSchema::string())
        .property("status", ResponseSchema::string());
    let hospital = ResponseSchema::object()
        .property("name", ResponseSchema::string())
        .property("traumaLevel", ResponseSchema::string())
        .property("distance", ResponseSchema::string());

    let schema = ResponseSchema::object()
        .property("safeZones", ResponseSchema::array(zone))
        .property("hospitals", ResponseSchema::array(hospital))
        .property("resourceNeeds", ResponseSchema::array(ResponseSchema::string()))
        .property("tacticalAdvice", ResponseSchema::string())
        .required(["safeZones", "hospitals", "resourceNeeds", "tacticalAdvice"]);

    let prompt = format!(
        "Generate a tactical disaster response plan for a {} in {}. Coordinates: {}, {}. \
         Return JSON with safeZones, hospitals (mock data), resourceNeeds, and tacticalAdvice.",
        alert.category, alert.location, alert.coordinates.lat, alert.coordinates.lng
    );
    StructuredRequest::text(prompt, schema)
}

/// Instruction for the search-grounded live incident lookup.
pub fn live_incident_prompt(near: Option<Coordinates>) -> String {
    let mut prompt = String::from("Search for a major active natural disaster globally.");
    if let Some(c) = near {
        prompt.push_str(&format!(
            " Prioritize recent events near {}, {} if provided.",
            c.lat, c.lng
        ));
    }
    prompt.push_str(" Return report with Type, Location, Severity, Summary, and Coords (Lat,Lng).");
    prompt
}

pub fn predictions_request() -> StructuredRequest {
    let item = ResponseSchema::object()
        .property("type", ResponseSchema::string())
        .property("location", ResponseSchema::string())
        .property("severity", ResponseSchema::string())
        .property("summary", ResponseSchema::string())
        .property("lat", ResponseSchema::number())
        .property("lng", ResponseSchema::number());

    StructuredRequest::text(
        "Predict 3 likely disasters in next 72h. Return JSON array with type, location, \
         severity, summary, lat, lng.",
        ResponseSchema::array(item),
    )
}

pub fn social_chatter_request(context: &str) -> StructuredRequest {
    let item = ResponseSchema::object()
        .property("username", ResponseSchema::string())
        .property("text", ResponseSchema::string());

    StructuredRequest::text(
        format!("Generate 5 social posts reacting to: \"{}\". Return JSON.", context),
        ResponseSchema::array(item),
    )
}

pub fn sentiment_request<S: AsRef<str>>(posts: &[S]) -> StructuredRequest {
    let schema = ResponseSchema::object()
        .property("postCount", ResponseSchema::integer())
        .property("sentimentScore", ResponseSchema::number())
        .property(
            "trendingKeywords",
            ResponseSchema::array(ResponseSchema::string()),
        )
        .property("alertTriggered", ResponseSchema::boolean())
        .property("rawTextAnalysis", ResponseSchema::string());

    let joined = posts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    StructuredRequest::text(format!("Analyze these posts: {}", joined), schema)
}

pub fn prevention_request(target: &str, location: &str) -> StructuredRequest {
    let checklist_item = ResponseSchema::object()
        .property(
            "task",
            ResponseSchema::string().describe("Specific mitigation task"),
        )
        .property(
            "priority",
            ResponseSchema::string().describe("Priority level: High, Medium, or Low"),
        )
        .required(["task", "priority"]);

    let schema = ResponseSchema::object()
        .property(
            "blueprintName",
            ResponseSchema::string().describe("Official name of the mitigation blueprint"),
        )
        .property(
            "readinessScore",
            ResponseSchema::number().describe("Estimated percentage of current readiness"),
        )
        .property("checklist", ResponseSchema::array(checklist_item))
        .property(
            "mitigationSteps",
            ResponseSchema::array(ResponseSchema::string())
                .describe("Specific steps for infrastructure mitigation"),
        )
        .property(
            "evacuationProtocols",
            ResponseSchema::array(ResponseSchema::string())
                .describe("Clear steps for evacuation procedures"),
        )
        .required([
            "blueprintName",
            "readinessScore",
            "checklist",
            "mitigationSteps",
            "evacuationProtocols",
        ]);

    let prompt = format!(
        "Generate a comprehensive proactive disaster prevention strategy for a {} scenario in \
         {}. Include infrastructure hardening, community readiness, and specific emergency \
         protocols. Return the strategy in JSON format.",
        target, location
    );
    StructuredRequest::text(prompt, schema)
}

/// One-line digest of an alert as read out in the briefing.
pub fn alert_digest(alert: &Alert) -> String {
    format!(
        "{} at {}. Severity: {}. Details: {}",
        alert.category, alert.location, alert.severity, alert.summary
    )
}

/// System instruction for the spoken dispatcher briefing.
pub fn briefing_instruction(alerts: &[Alert]) -> String {
    let summary = alerts
        .iter()
        .map(alert_digest)
        .collect::<Vec<_>>()
        .join("; ");
    format!(
        "You are the Aegis Disaster Command AI Dispatcher. Provide a professional, concise, and \
         calm situational awareness briefing. Use military-style terminology. Summarize the \
         following alerts for the commander: {}. End the briefing with \"End of report.\"",
        summary
    )
}
