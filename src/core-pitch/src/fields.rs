//! Structured client details pulled out of a free-text prompt, and the `{{cliente.*}}`
//! placeholder substitution used when no LLM is available.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Client details recognized in a prompt. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objectives: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

impl ClientFields {
    pub fn is_empty(&self) -> bool {
        *self == ClientFields::default()
    }

    fn slot(&mut self, label: &str) -> Option<&mut Option<String>> {
        let label = label.to_lowercase();
        let slot = match label.as_str() {
            "nombre" | "name" | "cliente" | "client" => &mut self.name,
            "empresa" | "company" | "compañía" | "compania" => &mut self.company,
            "objetivos" | "objetivo" | "objectives" | "goals" => &mut self.objectives,
            "alcance" | "scope" => &mut self.scope,
            "timeline" | "plazo" | "plazos" | "calendario" => &mut self.timeline,
            "equipo" | "team" => &mut self.team,
            "precio" | "price" | "presupuesto" | "budget" => &mut self.price,
            _ => return None,
        };
        Some(slot)
    }
}

/// `Label: value` at the start of a line, optionally bulleted or bolded (`- **Empresa**: Acme`).
static FIELD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[\s\-\*•]*\**(nombre|name|cliente|client|empresa|company|compañía|compania|objetivos|objetivo|objectives|goals|alcance|scope|timeline|plazos|plazo|calendario|equipo|team|precio|price|presupuesto|budget)\**\s*[:=\-–]\s*(.+?)\s*$",
    )
    .expect("field line pattern is a valid regular expression")
});

/// Extracts the client fields a prompt states explicitly. The first occurrence of a label wins.
pub fn extract_fields(prompt: &str) -> ClientFields {
    let mut fields = ClientFields::default();
    for caps in FIELD_LINE.captures_iter(prompt) {
        let (Some(label), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let value = value.as_str().trim_matches(|c: char| c == '*' || c.is_whitespace());
        if value.is_empty() {
            continue;
        }
        if let Some(slot) = fields.slot(label.as_str())
            && slot.is_none()
        {
            *slot = Some(value.to_string());
        }
    }
    fields
}

/// Substitutes the `{{cliente.*}}` placeholders of the template with the client fields.
/// The name defaults to `Cliente`; missing fields become empty strings.
pub fn fill_placeholders(html: &str, fields: &ClientFields) -> String {
    let or_empty = |v: &Option<String>| v.clone().unwrap_or_default();
    let replacements = [
        ("{{cliente.nombre}}", fields.name.clone().unwrap_or_else(|| "Cliente".to_string())),
        ("{{cliente.empresa}}", or_empty(&fields.company)),
        ("{{cliente.objetivos}}", or_empty(&fields.objectives)),
        ("{{cliente.alcance}}", or_empty(&fields.scope)),
        ("{{cliente.timeline}}", or_empty(&fields.timeline)),
        ("{{cliente.equipo}}", or_empty(&fields.team)),
        ("{{cliente.precio}}", or_empty(&fields.price)),
    ];
    replacements
        .iter()
        .fold(html.to_string(), |acc, (placeholder, value)| acc.replace(placeholder, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_spanish_fields() {
        let prompt = "Propuesta para un cliente nuevo.\n\
                      Nombre: Laura Gómez\n\
                      Empresa: Acme Motors\n\
                      Objetivos: aumentar leads un 30%\n\
                      - **Presupuesto**: 12.000 EUR\n\
                      Equipo - 3 personas\n";
        let fields = extract_fields(prompt);
        assert_eq!(fields.name.as_deref(), Some("Laura Gómez"));
        assert_eq!(fields.company.as_deref(), Some("Acme Motors"));
        assert_eq!(fields.objectives.as_deref(), Some("aumentar leads un 30%"));
        assert_eq!(fields.price.as_deref(), Some("12.000 EUR"));
        assert_eq!(fields.team.as_deref(), Some("3 personas"));
        assert_eq!(fields.scope, None);
        assert_eq!(fields.timeline, None);
    }

    #[test]
    fn test_extract_english_fields_first_wins() {
        let prompt = "name: Sam\nCompany: Initech\nScope: website redesign\nTimeline: 6 weeks\ncompany: Other";
        let fields = extract_fields(prompt);
        assert_eq!(fields.name.as_deref(), Some("Sam"));
        assert_eq!(fields.company.as_deref(), Some("Initech"));
        assert_eq!(fields.scope.as_deref(), Some("website redesign"));
        assert_eq!(fields.timeline.as_deref(), Some("6 weeks"));
    }

    #[test]
    fn test_free_text_has_no_fields() {
        let fields = extract_fields("Make the page about a bakery that sells sourdough in Madrid");
        assert!(fields.is_empty());
    }

    #[test]
    fn test_fill_placeholders() {
        let html = "<h1>Hola {{cliente.nombre}}</h1><p>{{cliente.empresa}} - {{cliente.precio}}</p>";
        let fields = ClientFields {
            company: Some("Acme".to_string()),
            ..Default::default()
        };
        assert_eq!(fill_placeholders(html, &fields), "<h1>Hola Cliente</h1><p>Acme - </p>");
    }

    #[test]
    fn test_fill_placeholders_without_placeholders_is_identity() {
        let html = "<h1>Hello</h1>";
        assert_eq!(fill_placeholders(html, &ClientFields::default()), html);
    }

    #[test]
    fn test_fields_serialize_camel_case_and_skip_missing() {
        let fields = ClientFields {
            name: Some("Ana".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&fields).unwrap(), r#"{"name":"Ana"}"#);
    }
}
