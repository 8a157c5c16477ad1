use std::collections::HashMap;

use crate::extract::TextNode;
use crate::fields::ClientFields;
use crate::Error;
use indoc::indoc;
use subst::substitute;

const SYSTEM_PROMPT: &str = indoc! { "
  Eres un experto en personalizar SOLO TEXTOS de páginas web comerciales.

  Recibirás una lista numerada de textos extraídos de una página HTML. Cada línea tiene el formato:
  N. [tipo] texto

  REGLAS CRÍTICAS (NO VIOLAR):
  1. Devuelve EXACTAMENTE una línea por cada texto recibido, en el mismo orden.
  2. Conserva el número N y la etiqueta [tipo] de cada línea tal cual.
  3. Solo cambia el texto que va después de la etiqueta.
  4. No añadas HTML, markdown, comillas, explicaciones ni comentarios.
  5. Si un texto no debe cambiar, repítelo igual.
  6. Mantén una longitud parecida a la del texto original para no romper el diseño.
"};

pub fn system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

const LINE_PROTOCOL: &str = indoc! { "
  FORMATO DE RESPUESTA (OBLIGATORIO):
  - Exactamente ${COUNT} líneas, una por texto, con el formato: N. [tipo] texto personalizado
  - Conserva la numeración y las etiquetas entre corchetes.
  - Sin texto adicional antes ni después de la lista.
"};

const CUSTOM_PROMPT: &str = indoc! { "
  ${INSTRUCTION}

  INSTRUCCIONES CRÍTICAS:
  - SOLO cambia los textos visibles al usuario (títulos, párrafos, listas, pasos del circuito).
  - No inventes secciones nuevas ni elimines ninguna.

  TEXTOS DE LA PÁGINA:
  ${TEXTS}

  ${PROTOCOL}
"};

const CLIENT_FIELDS_PROMPT: &str = indoc! { "
  Personaliza SOLO los textos de esta página para el cliente.

  Datos del cliente:
  Nombre: ${NAME}
  Empresa: ${COMPANY}
  Objetivos: ${OBJECTIVES}
  Alcance: ${SCOPE}
  Timeline: ${TIMELINE}
  Equipo: ${TEAM}
  Precio: ${PRICE}

  TEXTOS DE LA PÁGINA:
  ${TEXTS}

  ${PROTOCOL}
"};

/// Renders the texts as the numbered `N. [kind] text` list, one line per text.
/// Whitespace inside a text (including newlines) is collapsed so the protocol stays line-based.
pub fn format_text_list(nodes: &[TextNode]) -> String {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| format!("{}. [{}] {}", i + 1, node.kind, collapse_whitespace(&node.original_text)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn line_protocol(count: usize) -> Result<String, Error> {
    let res = substitute(LINE_PROTOCOL, &{
        let mut v = HashMap::new();
        v.insert("COUNT".to_string(), count.to_string());
        v
    })?;
    Ok(res)
}

/// Prompt built around a free-form instruction written by whoever requested the page.
pub fn prompt_custom(instruction: &str, nodes: &[TextNode]) -> Result<String, Error> {
    let res = substitute(CUSTOM_PROMPT, &{
        let mut v = HashMap::new();
        v.insert("INSTRUCTION".to_string(), instruction.trim().to_string());
        v.insert("TEXTS".to_string(), format_text_list(nodes));
        v.insert("PROTOCOL".to_string(), line_protocol(nodes.len())?);
        v
    })?;
    Ok(res)
}

/// Prompt built from structured client fields, for requests without a usable instruction.
pub fn prompt_client_fields(fields: &ClientFields, nodes: &[TextNode]) -> Result<String, Error> {
    let value = |v: &Option<String>| v.clone().unwrap_or_default();
    let res = substitute(CLIENT_FIELDS_PROMPT, &{
        let mut v = HashMap::new();
        v.insert(
            "NAME".to_string(),
            fields.name.clone().unwrap_or_else(|| "Cliente".to_string()),
        );
        v.insert("COMPANY".to_string(), value(&fields.company));
        v.insert("OBJECTIVES".to_string(), value(&fields.objectives));
        v.insert("SCOPE".to_string(), value(&fields.scope));
        v.insert("TIMELINE".to_string(), value(&fields.timeline));
        v.insert("TEAM".to_string(), value(&fields.team));
        v.insert("PRICE".to_string(), value(&fields.price));
        v.insert("TEXTS".to_string(), format_text_list(nodes));
        v.insert("PROTOCOL".to_string(), line_protocol(nodes.len())?);
        v
    })?;
    Ok(res)
}
