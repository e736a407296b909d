//! Turtle serializer.
//!
//! Output is deterministic: prefixes in name order, then triples sorted and
//! grouped by subject, with `rdf:type` first among each subject's predicates.

use std::fmt::Write as _;

use custody_graph_ir::vocab::rdf;
use custody_graph_ir::{Graph, LiteralValue, Term, Triple};

use crate::lex::chars::{is_iri_char, is_plain_local};

/// Render `graph` as Turtle.
pub fn to_turtle(graph: &Graph) -> String {
    let writer = Writer { graph };
    let mut out = String::new();

    for (prefix, namespace) in &graph.prefixes {
        let _ = writeln!(out, "@prefix {prefix}: {} .", iri_ref(namespace));
    }
    if !graph.prefixes.is_empty() && !graph.is_empty() {
        out.push('\n');
    }

    let mut sorted = graph.clone();
    sorted.canonicalize();
    for (subject, triples) in sorted.group_by_subject() {
        writer.subject_block(&mut out, subject, triples);
    }
    out
}

struct Writer<'a> {
    graph: &'a Graph,
}

impl Writer<'_> {
    fn subject_block(&self, out: &mut String, subject: &Term, triples: &[Triple]) {
        let mut runs: Vec<&[Triple]> = Vec::new();
        let mut rest = triples;
        while let Some(first) = rest.first() {
            let len = rest.iter().take_while(|t| t.p == first.p).count();
            let (run, tail) = rest.split_at(len);
            runs.push(run);
            rest = tail;
        }
        runs.sort_by_key(|run| run[0].p.as_iri() != Some(rdf::TYPE));

        out.push_str(&self.term(subject));
        for (i, run) in runs.iter().enumerate() {
            out.push_str(if i == 0 { " " } else { " ;\n    " });
            out.push_str(&self.predicate(&run[0].p));
            for (j, triple) in run.iter().enumerate() {
                out.push_str(if j == 0 { " " } else { ", " });
                out.push_str(&self.term(&triple.o));
            }
        }
        out.push_str(" .\n");
    }

    fn predicate(&self, p: &Term) -> String {
        match p.as_iri() {
            Some(rdf::TYPE) => "a".to_string(),
            _ => self.term(p),
        }
    }

    fn term(&self, term: &Term) -> String {
        match term {
            Term::Iri(iri) => self.iri(iri),
            Term::BlankNode(id) => id.to_string(),
            Term::Literal {
                value,
                datatype,
                language,
            } => {
                let bare = match value {
                    LiteralValue::Integer(_) | LiteralValue::Boolean(_) => true,
                    LiteralValue::Double(d) => d.is_finite(),
                    LiteralValue::String(_) => false,
                };
                if bare && language.is_none() {
                    return value.lexical();
                }
                let quoted = quote(&value.lexical());
                match language {
                    Some(lang) => format!("{quoted}@{lang}"),
                    None if datatype.is_xsd_string() => quoted,
                    None => format!("{quoted}^^{}", self.iri(datatype.as_iri())),
                }
            }
        }
    }

    /// `prefix:local` under the longest matching namespace, else `<iri>`.
    fn iri(&self, iri: &str) -> String {
        self.graph
            .prefixes
            .iter()
            .filter_map(|(prefix, ns)| {
                let local = iri.strip_prefix(ns.as_str())?;
                is_plain_local(local).then_some((ns.len(), prefix, local))
            })
            .max_by_key(|(len, _, _)| *len)
            .map(|(_, prefix, local)| format!("{prefix}:{local}"))
            .unwrap_or_else(|| iri_ref(iri))
    }
}

/// `<iri>`, with characters not allowed in IRIREF written as `\u`/`\U` escapes.
fn iri_ref(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len() + 2);
    out.push('<');
    for c in iri.chars() {
        if is_iri_char(c) {
            out.push(c);
        } else if u32::from(c) <= 0xFFFF {
            let _ = write!(out, "\\u{:04X}", u32::from(c));
        } else {
            let _ = write!(out, "\\U{:08X}", u32::from(c));
        }
    }
    out.push('>');
    out
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use custody_graph_ir::Datatype;

    const NW: &str = "http://northwind.com/";
    const MODEL: &str = "http://northwind.com/model/";

    fn northwind_graph() -> Graph {
        let mut g = Graph::new();
        g.add_prefix("nw", NW);
        g.add_prefix("model", MODEL);
        g
    }

    #[test]
    fn test_groups_by_subject_and_predicate() {
        let mut g = northwind_graph();
        let order = Term::iri(format!("{NW}Order-10248"));
        g.add_triple(
            order.clone(),
            Term::iri(format!("{MODEL}line")),
            Term::iri(format!("{NW}Line-2")),
        );
        g.add_triple(order.clone(), Term::iri(rdf::TYPE), Term::iri(format!("{MODEL}Order")));
        g.add_triple(
            order,
            Term::iri(format!("{MODEL}line")),
            Term::iri(format!("{NW}Line-1")),
        );

        assert_eq!(
            to_turtle(&g),
            "@prefix model: <http://northwind.com/model/> .\n\
             @prefix nw: <http://northwind.com/> .\n\
             \n\
             nw:Order-10248 a model:Order ;\n    model:line nw:Line-1, nw:Line-2 .\n"
        );
    }

    #[test]
    fn test_longest_namespace_wins() {
        let g = northwind_graph();
        let w = Writer { graph: &g };
        assert_eq!(w.iri("http://northwind.com/model/Order"), "model:Order");
        assert_eq!(w.iri("http://northwind.com/Order-1"), "nw:Order-1");
        assert_eq!(w.iri("http://northwind.com/a/b"), "<http://northwind.com/a/b>");
        assert_eq!(w.iri("urn:x"), "<urn:x>");
    }

    #[test]
    fn test_literal_forms() {
        let g = northwind_graph();
        let w = Writer { graph: &g };
        assert_eq!(w.term(&Term::integer(39)), "39");
        assert_eq!(w.term(&Term::boolean(true)), "true");
        assert_eq!(w.term(&Term::double(1.5)), "1.5E0");
        assert_eq!(w.term(&Term::double(f64::INFINITY)), "\"INF\"^^<http://www.w3.org/2001/XMLSchema#double>");
        assert_eq!(w.term(&Term::string("say \"hi\"\n")), r#""say \"hi\"\n""#);
        assert_eq!(w.term(&Term::lang_string("Chai", "en")), "\"Chai\"@en");
        assert_eq!(
            w.term(&Term::typed("18.00", Datatype::xsd_decimal())),
            "\"18.00\"^^<http://www.w3.org/2001/XMLSchema#decimal>"
        );
    }

    #[test]
    fn test_iri_outside_iriref_is_escaped() {
        let g = northwind_graph();
        let w = Writer { graph: &g };
        assert_eq!(
            w.iri("http://northwind.com/a b"),
            r"<http://northwind.com/a\u0020b>"
        );
        assert_eq!(w.iri("urn:x{\"y\"}"), r"<urn:x\u007B\u0022y\u0022\u007D>");
        assert_eq!(w.iri("urn:\u{1}"), r"<urn:\u0001>");
        assert_eq!(w.iri("urn:caf\u{e9}"), "<urn:caf\u{e9}>");
    }

    #[test]
    fn test_escaped_iris_reparse_to_the_same_graph() {
        let input = r"<http://northwind.com/A> <http://northwind.com/p> <http://northwind.com/a\u0020b> , <urn:q\u007B1\u007D> .";
        let graph = crate::parse_to_graph(input, None).unwrap();
        assert!(graph
            .objects()
            .contains(&Term::iri("http://northwind.com/a b")));

        let rendered = to_turtle(&graph);
        let reparsed = crate::parse_to_graph(&rendered, None).unwrap();
        let mut expected = graph.triples().to_vec();
        let mut actual = reparsed.triples().to_vec();
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected, "rendered:\n{rendered}");
    }

    #[test]
    fn test_empty_graph_is_prefixes_only() {
        assert_eq!(
            to_turtle(&northwind_graph()),
            "@prefix model: <http://northwind.com/model/> .\n@prefix nw: <http://northwind.com/> .\n"
        );
    }
}
