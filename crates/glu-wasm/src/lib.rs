//! WASM bindings for the Glu highlighter.
//!
//! Exposes `tokenize()` to JavaScript via wasm-bindgen. Each token comes back
//! as a plain object `{ kind, text, start, end }`; offsets are UTF-8 bytes.

use glu_lexer::Token;
use wasm_bindgen::prelude::*;

/// Tokenize `source` with the language registered as `language`.
///
/// Returns an array of `{ kind: string, text: string, start: number, end: number }`.
/// Throws a JS error for an unknown language.
#[wasm_bindgen]
pub fn tokenize(source: &str, language: &str) -> Result<JsValue, JsError> {
    let tokens = scan(source, language).map_err(|e| JsError::new(&e))?;

    let array = js_sys::Array::new();
    for token in tokens {
        let obj = js_sys::Object::new();
        set(&obj, "kind", &token.kind.name().into())?;
        set(&obj, "text", &token.text.into())?;
        set(&obj, "start", &(token.span.start as f64).into())?;
        set(&obj, "end", &(token.span.end as f64).into())?;
        array.push(&obj);
    }
    Ok(array.into())
}

/// Tags of every registered language.
#[wasm_bindgen]
pub fn languages() -> Vec<String> {
    glu_languages::all()
        .iter()
        .map(|lang| lang.tag.to_string())
        .collect()
}

/// Get the highlighter version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn scan<'src>(source: &'src str, language: &str) -> Result<Vec<Token<'src>>, String> {
    let lang = glu_languages::find(language).ok_or_else(|| format!("unknown language: {language}"))?;
    Ok(lang.definition().lex(source).collect())
}

fn set(obj: &js_sys::Object, key: &str, value: &JsValue) -> Result<(), JsError> {
    js_sys::Reflect::set(obj, &key.into(), value)
        .map(|_| ())
        .map_err(|_| JsError::new(&format!("Failed to set {key} property")))
}
