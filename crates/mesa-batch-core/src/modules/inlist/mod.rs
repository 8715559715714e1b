//! Line-preserving model of MESA inlists (Fortran namelist files).
//!
//! A document is parsed into ordered `&name ... /` blocks, each an ordered list
//! of blank, comment, active and `!`-disabled assignment lines. Typed setters
//! mutate the model and [`Inlist::render`] writes it back; lines that were not
//! touched keep their original text.

mod model;
mod parser;

pub use model::{
    Assignment, Inlist, InlistLine, NAMELIST_ORDER, Namelist, Placement, base_name, normalize_key,
};
pub use parser::parse_inlist;

impl Inlist {
    pub fn parse(source: &str) -> crate::domain::BatchResult<Self> {
        parse_inlist(source)
    }
}

/// Fortran string literal with single quotes; embedded quotes are doubled.
pub fn quoted(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

pub fn logical(flag: bool) -> &'static str {
    if flag { ".true." } else { ".false." }
}

/// Reverses [`quoted`]; unquoted text is returned trimmed.
pub fn unquote(value: &str) -> String {
    let trimmed = value.trim().trim_end_matches(',').trim_end();
    for quote in ['\'', '"'] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            let doubled = format!("{}{}", quote, quote);
            return inner.replace(&doubled, &quote.to_string());
        }
    }
    trimmed.to_string()
}

pub fn parse_logical(value: &str) -> Option<bool> {
    let lowered = value.trim().trim_end_matches(',').to_ascii_lowercase();
    match lowered.trim_matches('.') {
        "true" | "t" => Some(true),
        "false" | "f" => Some(false),
        _ => None,
    }
}
