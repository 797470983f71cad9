//! Prompt template and request body for the naming endpoint.

use serde_json::{Value, json};

use crate::element::ImageElement;

/// Instruction sent ahead of the element markup.
pub const NAMING_INSTRUCTION: &str = "Generate a filename for the image element below. \
1. If the name in src is already descriptive, use it as-is (for src=\"img/httpx-help.png\" answer httpx-help.png). \
2. Otherwise summarize the alt text into a filename. \
3. Otherwise name it after what the picture actually shows. \
The filename must be in English. Prefer distinctive words that set this picture apart: \
people, animals, objects, time or season, places. \
It does not have to be short but must not exceed 12 words; use few function words such as with, and, or. \
Use lowercase words separated by `-` and infer the extension from src. \
Output only the filename, without explanation. Answer as fast as possible.";

/// Builds the naming prompt for an element.
pub fn build_prompt<E: ImageElement + ?Sized>(element: &E) -> String {
    format!("{NAMING_INSTRUCTION}\n\n```\n{}\n```", element.markup())
}

/// Builds the JSON body of a completion request.
///
/// The endpoint streams its answer regardless of the `stream` flag.
pub(crate) fn completion_body(prompt: &str) -> Value {
    json!({
        "kimiplus_id": "kimi",
        "extend": { "sidebar": true },
        "model": "kimi",
        "stream": false,
        "use_search": false,
        "messages": [
            { "role": "user", "content": prompt },
        ],
        "refs": [],
        "history": [],
        "scene_labels": [],
    })
}
