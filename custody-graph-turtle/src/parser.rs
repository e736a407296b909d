//! Recursive-descent Turtle parser that emits into a [`GraphSink`].

use std::collections::HashMap;
use std::sync::Arc;

use custody_graph_ir::vocab::rdf;
use custody_graph_ir::{Datatype, GraphSink, LiteralValue, TermId};

use crate::error::{Result, TurtleError};
use crate::iri;
use crate::lex::{tokenize, Token, TokenKind};

pub struct Parser<'a, S> {
    tokens: Vec<Token>,
    pos: usize,
    sink: &'a mut S,
    prefixes: HashMap<String, String>,
    base: Option<String>,
}

impl<'a, S: GraphSink> Parser<'a, S> {
    pub fn new(input: &str, sink: &'a mut S) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(input)?,
            pos: 0,
            sink,
            prefixes: HashMap::new(),
            base: None,
        })
    }

    /// Start with a base IRI already in effect. An `@base` in the document
    /// still overrides it.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.sink.on_base(&base);
        self.base = Some(base);
        self
    }

    pub fn parse(mut self) -> Result<()> {
        while !self.at(&TokenKind::Eof) {
            self.statement()?;
        }
        Ok(())
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn at(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.kind()) == std::mem::discriminant(kind)
    }

    fn bump(&mut self) -> TokenKind {
        let kind = self.kind().clone();
        if !matches!(kind, TokenKind::Eof) {
            self.pos += 1;
        }
        kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        if self.at(&kind) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{kind}'")))
        }
    }

    fn unexpected(&self, wanted: &str) -> TurtleError {
        TurtleError::parse(
            self.current().start,
            format!("expected {wanted}, found '{}'", self.kind()),
        )
    }

    fn statement(&mut self) -> Result<()> {
        match self.kind() {
            TokenKind::KwPrefix => self.prefix_directive(true),
            TokenKind::KwSparqlPrefix => self.prefix_directive(false),
            TokenKind::KwBase => self.base_directive(true),
            TokenKind::KwSparqlBase => self.base_directive(false),
            _ => {
                self.triples()?;
                self.expect(TokenKind::Dot)
            }
        }
    }

    fn prefix_directive(&mut self, dotted: bool) -> Result<()> {
        self.bump();
        let TokenKind::PrefixedNameNs(prefix) = self.kind().clone() else {
            return Err(self.unexpected("a prefix name like 'ex:'"));
        };
        self.bump();
        let TokenKind::Iri(reference) = self.kind().clone() else {
            return Err(self.unexpected("a namespace IRI"));
        };
        self.bump();
        let namespace = iri::resolve(self.base.as_deref(), &reference)?;
        self.sink.on_prefix(&prefix, &namespace);
        self.prefixes.insert(prefix.to_string(), namespace);
        if dotted {
            self.expect(TokenKind::Dot)?;
        }
        Ok(())
    }

    fn base_directive(&mut self, dotted: bool) -> Result<()> {
        self.bump();
        let TokenKind::Iri(reference) = self.kind().clone() else {
            return Err(self.unexpected("a base IRI"));
        };
        self.bump();
        let base = iri::resolve(self.base.as_deref(), &reference)?;
        self.sink.on_base(&base);
        self.base = Some(base);
        if dotted {
            self.expect(TokenKind::Dot)?;
        }
        Ok(())
    }

    /// `subject predicateObjectList` or `blankNodePropertyList predicateObjectList?`
    fn triples(&mut self) -> Result<()> {
        if self.at(&TokenKind::LBracket) {
            let subject = self.blank_node_property_list()?;
            if !self.at(&TokenKind::Dot) {
                self.predicate_object_list(subject)?;
            }
            return Ok(());
        }

        let subject = match self.iri_like()? {
            Some(iri) => self.sink.term_iri(&iri),
            None => match self.kind().clone() {
                TokenKind::BlankNodeLabel(label) => {
                    self.bump();
                    self.sink.term_blank(Some(&*label))
                }
                TokenKind::Anon => {
                    self.bump();
                    self.sink.term_blank(None)
                }
                TokenKind::Nil => {
                    self.bump();
                    self.sink.term_iri(rdf::NIL)
                }
                TokenKind::LParen => {
                    self.bump();
                    self.collection()?
                }
                _ => return Err(self.unexpected("a subject")),
            },
        };
        self.predicate_object_list(subject)
    }

    /// An `<iri>`, `p:local` or `p:` at the current position, expanded.
    /// Returns `None` without consuming anything for any other token.
    fn iri_like(&mut self) -> Result<Option<String>> {
        let expanded = match self.kind() {
            TokenKind::Iri(reference) => iri::resolve(self.base.as_deref(), reference)?,
            TokenKind::PrefixedName { prefix, local } => self.expand(prefix, local)?,
            TokenKind::PrefixedNameNs(prefix) => self.expand(prefix, "")?,
            _ => return Ok(None),
        };
        self.bump();
        Ok(Some(expanded))
    }

    fn expand(&self, prefix: &str, local: &str) -> Result<String> {
        self.prefixes
            .get(prefix)
            .map(|ns| format!("{ns}{local}"))
            .ok_or_else(|| TurtleError::UndefinedPrefix(prefix.to_string()))
    }

    fn predicate_object_list(&mut self, subject: TermId) -> Result<()> {
        loop {
            let predicate = match self.iri_like()? {
                Some(iri) => self.sink.term_iri(&iri),
                None if self.at(&TokenKind::KwA) => {
                    self.bump();
                    self.sink.term_iri(rdf::TYPE)
                }
                None => return Err(self.unexpected("a predicate")),
            };

            loop {
                let object = self.object()?;
                self.sink.emit_triple(subject, predicate, object);
                if !self.at(&TokenKind::Comma) {
                    break;
                }
                self.bump();
            }

            // Any number of ';' may separate or trail predicate-object pairs.
            if !self.at(&TokenKind::Semicolon) {
                return Ok(());
            }
            while self.at(&TokenKind::Semicolon) {
                self.bump();
            }
            if matches!(self.kind(), TokenKind::Dot | TokenKind::RBracket | TokenKind::Eof) {
                return Ok(());
            }
        }
    }

    fn object(&mut self) -> Result<TermId> {
        if let Some(iri) = self.iri_like()? {
            return Ok(self.sink.term_iri(&iri));
        }
        match self.kind().clone() {
            TokenKind::BlankNodeLabel(label) => {
                self.bump();
                Ok(self.sink.term_blank(Some(&*label)))
            }
            TokenKind::Anon => {
                self.bump();
                Ok(self.sink.term_blank(None))
            }
            TokenKind::Nil => {
                self.bump();
                Ok(self.sink.term_iri(rdf::NIL))
            }
            TokenKind::LBracket => self.blank_node_property_list(),
            TokenKind::LParen => {
                self.bump();
                self.collection()
            }
            TokenKind::String(value) => {
                self.bump();
                self.string_literal(&value)
            }
            TokenKind::Integer(lexical) => {
                self.bump();
                Ok(match lexical.parse::<i64>() {
                    Ok(n) => self
                        .sink
                        .term_literal_value(LiteralValue::Integer(n), Datatype::xsd_integer()),
                    Err(_) => self
                        .sink
                        .term_literal(&lexical, Datatype::xsd_integer(), None),
                })
            }
            TokenKind::Decimal(lexical) => {
                self.bump();
                Ok(self.sink.term_literal(&lexical, Datatype::xsd_decimal(), None))
            }
            TokenKind::Double(lexical) => {
                self.bump();
                Ok(match lexical.parse::<f64>() {
                    Ok(d) => self
                        .sink
                        .term_literal_value(LiteralValue::Double(d), Datatype::xsd_double()),
                    Err(_) => self.sink.term_literal(&lexical, Datatype::xsd_double(), None),
                })
            }
            TokenKind::KwTrue | TokenKind::KwFalse => {
                let value = matches!(self.bump(), TokenKind::KwTrue);
                Ok(self
                    .sink
                    .term_literal_value(LiteralValue::Boolean(value), Datatype::xsd_boolean()))
            }
            _ => Err(self.unexpected("an object")),
        }
    }

    /// The optional `@lang` or `^^datatype` after a quoted string.
    fn string_literal(&mut self, value: &Arc<str>) -> Result<TermId> {
        match self.kind().clone() {
            TokenKind::LangTag(lang) => {
                self.bump();
                Ok(self
                    .sink
                    .term_literal(value, Datatype::rdf_lang_string(), Some(&*lang)))
            }
            TokenKind::DoubleCaret => {
                self.bump();
                let Some(datatype) = self.iri_like()? else {
                    return Err(self.unexpected("a datatype IRI"));
                };
                Ok(self
                    .sink
                    .term_literal(value, Datatype::from_iri(datatype), None))
            }
            _ => Ok(self.sink.term_literal(value, Datatype::xsd_string(), None)),
        }
    }

    /// `[ predicateObjectList ]`, current token is `[`.
    fn blank_node_property_list(&mut self) -> Result<TermId> {
        self.expect(TokenKind::LBracket)?;
        let node = self.sink.term_blank(None);
        self.predicate_object_list(node)?;
        self.expect(TokenKind::RBracket)?;
        Ok(node)
    }

    /// Items of `( ... )` as an `rdf:first`/`rdf:rest` chain; the `(` is
    /// already consumed.
    fn collection(&mut self) -> Result<TermId> {
        let mut items = Vec::new();
        while !self.at(&TokenKind::RParen) {
            if self.at(&TokenKind::Eof) {
                return Err(self.unexpected("')'"));
            }
            items.push(self.object()?);
        }
        self.bump();

        let nil = self.sink.term_iri(rdf::NIL);
        if items.is_empty() {
            return Ok(nil);
        }
        let first = self.sink.term_iri(rdf::FIRST);
        let rest = self.sink.term_iri(rdf::REST);
        let nodes: Vec<TermId> = items.iter().map(|_| self.sink.term_blank(None)).collect();
        for (i, (&node, &item)) in nodes.iter().zip(&items).enumerate() {
            self.sink.emit_triple(node, first, item);
            let next = nodes.get(i + 1).copied().unwrap_or(nil);
            self.sink.emit_triple(node, rest, next);
        }
        Ok(nodes[0])
    }
}

/// Parse a Turtle document into `sink`.
pub fn parse<S: GraphSink>(input: &str, sink: &mut S) -> Result<()> {
    Parser::new(input, sink)?.parse()
}

/// Parse with `base` in effect for relative IRIs.
pub fn parse_with_base<S: GraphSink>(input: &str, base: &str, sink: &mut S) -> Result<()> {
    Parser::new(input, sink)?.with_base(base).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use custody_graph_ir::{Graph, GraphCollectorSink, Term};

    const NW: &str = "@prefix nw: <http://northwind.com/> .\n\
                      @prefix model: <http://northwind.com/model/> .\n";

    fn graph(ttl: &str) -> Graph {
        let mut sink = GraphCollectorSink::new();
        parse(ttl, &mut sink).unwrap();
        sink.finish()
    }

    fn nw(local: &str) -> Term {
        Term::iri(format!("http://northwind.com/{local}"))
    }

    fn model(local: &str) -> Term {
        Term::iri(format!("http://northwind.com/model/{local}"))
    }

    #[test]
    fn test_predicate_and_object_lists() {
        let g = graph(&format!(
            "{NW}nw:Order-10248 a model:Order ;\n\
               model:customer nw:Customer-VINET ;\n\
               model:lines nw:Line-1, nw:Line-2 ."
        ));
        assert_eq!(g.len(), 4);
        assert_eq!(
            g.triples()[0],
            custody_graph_ir::Triple::new(nw("Order-10248"), Term::iri(rdf::TYPE), model("Order"))
        );
        assert_eq!(g.triples()[3].o, nw("Line-2"));
        assert_eq!(g.prefixes.len(), 2);
    }

    #[test]
    fn test_literals() {
        let g = graph(&format!(
            "{NW}nw:Product-1 model:name \"Chai\" ;\n\
               model:label \"Chai\"@en ;\n\
               model:units 39 ;\n\
               model:price 18.00 ;\n\
               model:weight 1.5e0 ;\n\
               model:discontinued false ;\n\
               model:code \"X1\"^^model:Code ."
        ));
        let objects: Vec<&Term> = g.iter().map(|t| &t.o).collect();
        assert_eq!(objects[0], &Term::string("Chai"));
        assert_eq!(objects[1], &Term::lang_string("Chai", "en"));
        assert_eq!(objects[2], &Term::integer(39));
        assert_eq!(objects[3], &Term::typed("18.00", Datatype::xsd_decimal()));
        assert_eq!(objects[4], &Term::double(1.5));
        assert_eq!(objects[5], &Term::boolean(false));
        assert_eq!(
            objects[6],
            &Term::typed("X1", Datatype::from_iri("http://northwind.com/model/Code"))
        );
    }

    #[test]
    fn test_trailing_semicolon() {
        let g = graph(&format!("{NW}nw:Shipper-1 model:name \"Speedy\" ; ."));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_blank_node_property_list() {
        let g = graph(&format!(
            "{NW}nw:Employee-1 model:address [ model:city \"Seattle\" ] ."
        ));
        assert_eq!(g.len(), 2);
        let city = Term::iri("http://northwind.com/model/city");
        let address = Term::iri("http://northwind.com/model/address");
        let inner = g.iter().find(|t| t.p == city).unwrap();
        let outer = g.iter().find(|t| t.p == address).unwrap();
        assert!(inner.s.is_blank());
        assert_eq!(outer.o, inner.s);
        assert_eq!(outer.s, Term::iri("http://northwind.com/Employee-1"));
    }

    #[test]
    fn test_collection() {
        let g = graph(&format!("{NW}nw:Region-1 model:territories ( 1 2 ) ."));
        // head triple + 2 x (first, rest)
        assert_eq!(g.len(), 5);
        assert!(g
            .iter()
            .any(|t| t.p == Term::iri(rdf::REST) && t.o == Term::iri(rdf::NIL)));
    }

    #[test]
    fn test_sparql_style_directives() {
        let g = graph(
            "PREFIX nw: <http://northwind.com/>\n\
             BASE <http://northwind.com/>\n\
             <Order-1> nw:next <Order-2> .",
        );
        assert_eq!(g.triples()[0].s, nw("Order-1"));
        assert_eq!(g.base.as_deref(), Some("http://northwind.com/"));
    }

    #[test]
    fn test_parse_with_base() {
        let mut sink = GraphCollectorSink::new();
        parse_with_base("<a> <b> <c> .", "http://northwind.com/data/", &mut sink).unwrap();
        let g = sink.finish();
        assert_eq!(g.triples()[0].s, Term::iri("http://northwind.com/data/a"));
    }

    #[test]
    fn test_undefined_prefix() {
        let mut sink = GraphCollectorSink::new();
        let err = parse("nw:a nw:b nw:c .", &mut sink).unwrap_err();
        assert!(matches!(err, TurtleError::UndefinedPrefix(p) if p == "nw"));
    }

    #[test]
    fn test_relative_iri_without_base() {
        let mut sink = GraphCollectorSink::new();
        let err = parse("<a> <http://x/p> <http://x/o> .", &mut sink).unwrap_err();
        assert!(matches!(err, TurtleError::IriResolution(_)));
    }

    #[test]
    fn test_missing_dot_is_a_parse_error() {
        let mut sink = GraphCollectorSink::new();
        let err = parse(&format!("{NW}nw:a model:p nw:b"), &mut sink).unwrap_err();
        match err {
            TurtleError::Parse { message, .. } => {
                assert!(message.contains("expected '.'"), "{message}")
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_literal_subject_is_rejected() {
        let mut sink = GraphCollectorSink::new();
        let err = parse(&format!("{NW}\"x\" model:p nw:b ."), &mut sink).unwrap_err();
        assert!(err.to_string().contains("expected a subject"));
    }
}
