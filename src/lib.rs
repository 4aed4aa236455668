pub mod backend;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod draw;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;

pub use backend::Document;
pub use config::Config;
pub use ir::Grammar;
pub use parser::{ParseError, parse_grammar};

use backend::{HtmlSurface, SvgSurface, TikzSurface};
use ir::{LiteralKind, Node};

/// Renders `grammar` to SVG: one document, or one per production in split
/// mode.
pub fn render_svg(grammar: &Grammar, config: &Config) -> anyhow::Result<Vec<Document>> {
    let mut surface = SvgSurface::new(&config.theme, &config.render);
    render::render(&mut surface, grammar, config)?;
    Ok(surface.into_documents())
}

pub fn render_html(grammar: &Grammar, config: &Config) -> anyhow::Result<Document> {
    let mut surface = HtmlSurface::new(&config.theme, &config.render);
    if let Some(title) = grammar_title(grammar) {
        surface = surface.with_title(title);
    }
    render::render(&mut surface, grammar, config)?;
    Ok(surface.finish())
}

pub fn render_tikz(grammar: &Grammar, config: &Config) -> anyhow::Result<Vec<Document>> {
    let mut surface = TikzSurface::new();
    render::render(&mut surface, grammar, config)?;
    Ok(surface.into_documents())
}

/// Parses EBNF source and renders the whole grammar as a single SVG
/// document, whatever `split_productions` says.
pub fn render_with_config(source: &str, config: &Config) -> anyhow::Result<String> {
    let grammar = parse_grammar(source)?;
    let mut config = config.clone();
    config.render.split_productions = false;
    let documents = render_svg(&grammar, &config)?;
    documents
        .into_iter()
        .next()
        .map(|doc| doc.content)
        .ok_or_else(|| anyhow::anyhow!("grammar produced no diagram"))
}

pub fn render(source: &str) -> anyhow::Result<String> {
    render_with_config(source, &Config::default())
}

fn grammar_title(grammar: &Grammar) -> Option<&str> {
    let Node::Grammar { title, .. } = grammar.node(grammar.root()?)? else {
        return None;
    };
    match grammar.node((*title)?)? {
        Node::Literal {
            text,
            kind: LiteralKind::Title,
        } => Some(text.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_produces_a_single_svg() {
        let svg = render("expr = term { ( \"+\" | \"-\" ) term } .\nterm = ?digit? .").unwrap();
        assert!(svg.starts_with("<?xml"));
        assert_eq!(svg.matches("<svg").count(), 1);
        assert!(svg.contains("<a xlink:href=\"#term\">"));
    }

    #[test]
    fn html_title_comes_from_the_grammar() {
        let grammar = parse_grammar("\"Tiny\" { a = \"x\" . }").unwrap();
        let page = render_html(&grammar, &Config::default()).unwrap();
        assert!(page.content.contains("<title>Tiny</title>"));
    }

    #[test]
    fn parse_errors_surface_through_render() {
        let err = render("a = .").unwrap_err();
        assert!(err.downcast_ref::<ParseError>().is_some());
    }
}
