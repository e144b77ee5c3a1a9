#[cfg(test)]
#[path = "syntaxes_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use ratatui::style::Color;
use syntect::highlighting::Color as SyntectColor;
use syntect::parsing::SyntaxReference;
use syntect::parsing::SyntaxSet;

pub static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

pub struct Syntaxes {}

impl Syntaxes {
    pub fn list() -> Vec<String> {
        let mut syntaxes = SYNTAX_SET
            .syntaxes()
            .iter()
            .map(|syntax| return syntax.name.to_string())
            .collect::<Vec<String>>();
        syntaxes.sort();
        syntaxes.dedup();

        return syntaxes;
    }

    /// Resolves the language tag of a fenced code block, falling back to plain
    /// text for unknown or missing tags.
    pub fn get(name: &str) -> &'static SyntaxReference {
        let name = name.trim();
        if name.is_empty() {
            return SYNTAX_SET.find_syntax_plain_text();
        }

        if let Some(syntax) = SYNTAX_SET.find_syntax_by_token(name) {
            return syntax;
        }

        if let Some(syntax) = SYNTAX_SET.find_syntax_by_name(name) {
            return syntax;
        }

        return SYNTAX_SET.find_syntax_plain_text();
    }

    /// base16 themes encode terminal palette indexes with a zero alpha.
    pub fn translate_colour(colour: SyntectColor) -> Option<Color> {
        if colour.a == 0 {
            return Some(Color::Indexed(colour.r));
        }

        return Some(Color::Rgb(colour.r, colour.g, colour.b));
    }
}
