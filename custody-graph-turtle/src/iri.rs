//! Relative IRI resolution (RFC 3986 section 5.2).

use crate::error::{Result, TurtleError};

/// The five components of an IRI reference. Absent and empty are distinct.
#[derive(Debug, Default, PartialEq)]
struct Parts<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

fn split(iri: &str) -> Parts<'_> {
    let mut rest = iri;
    let mut parts = Parts::default();

    if let Some(i) = rest.find('#') {
        parts.fragment = Some(&rest[i + 1..]);
        rest = &rest[..i];
    }
    if let Some(i) = rest.find('?') {
        parts.query = Some(&rest[i + 1..]);
        rest = &rest[..i];
    }
    if let Some(i) = rest.find(':') {
        let candidate = &rest[..i];
        if is_scheme(candidate) {
            parts.scheme = Some(candidate);
            rest = &rest[i + 1..];
        }
    }
    if let Some(after) = rest.strip_prefix("//") {
        let end = after.find('/').unwrap_or(after.len());
        parts.authority = Some(&after[..end]);
        rest = &after[end..];
    }
    parts.path = rest;
    parts
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// True when `iri` carries a scheme and needs no base.
pub fn is_absolute(iri: &str) -> bool {
    split(iri).scheme.is_some()
}

/// Resolve `reference` against `base`.
pub fn resolve(base: Option<&str>, reference: &str) -> Result<String> {
    let r = split(reference);
    if r.scheme.is_some() {
        return Ok(recompose(
            r.scheme,
            r.authority,
            &remove_dot_segments(r.path),
            r.query,
            r.fragment,
        ));
    }

    let base = base.ok_or_else(|| {
        TurtleError::IriResolution(format!("relative IRI <{reference}> with no base"))
    })?;
    let b = split(base);
    if b.scheme.is_none() {
        return Err(TurtleError::IriResolution(format!(
            "base <{base}> is not an absolute IRI"
        )));
    }

    let (authority, path, query) = if r.authority.is_some() {
        (r.authority, remove_dot_segments(r.path), r.query)
    } else if r.path.is_empty() {
        (b.authority, b.path.to_string(), r.query.or(b.query))
    } else if r.path.starts_with('/') {
        (b.authority, remove_dot_segments(r.path), r.query)
    } else {
        let merged = match b.path.rfind('/') {
            None if b.authority.is_some() => format!("/{}", r.path),
            None => r.path.to_string(),
            Some(i) => format!("{}{}", &b.path[..=i], r.path),
        };
        (b.authority, remove_dot_segments(&merged), r.query)
    };

    Ok(recompose(b.scheme, authority, &path, query, r.fragment))
}

fn recompose(
    scheme: Option<&str>,
    authority: Option<&str>,
    path: &str,
    query: Option<&str>,
    fragment: Option<&str>,
) -> String {
    let mut out = String::new();
    if let Some(scheme) = scheme {
        out.push_str(scheme);
        out.push(':');
    }
    if let Some(authority) = authority {
        out.push_str("//");
        out.push_str(authority);
    }
    out.push_str(path);
    if let Some(query) = query {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

/// RFC 3986 section 5.2.4.
fn remove_dot_segments(path: &str) -> String {
    let mut input = path;
    let mut output = String::with_capacity(path.len());

    while !input.is_empty() {
        if let Some(rest) = input.strip_prefix("../") {
            input = rest;
        } else if let Some(rest) = input.strip_prefix("./") {
            input = rest;
        } else if input.starts_with("/./") {
            input = &input[2..];
        } else if input == "/." {
            input = "/";
        } else if input.starts_with("/../") || input == "/.." {
            input = if input == "/.." { "/" } else { &input[3..] };
            let cut = output.rfind('/').unwrap_or(0);
            output.truncate(cut);
        } else if input == "." || input == ".." {
            input = "";
        } else {
            let start = usize::from(input.starts_with('/'));
            let end = input[start..].find('/').map_or(input.len(), |i| i + start);
            output.push_str(&input[..end]);
            input = &input[end..];
        }
    }
    output
}
