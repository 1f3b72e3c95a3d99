// src/core/cookies.rs
//
// The cookie file holds the raw `Cookie:` request header copied from a logged-in
// browser session: `name1=value1; name2=value2; ...`.

use std::{fs, path::Path};

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Split a cookie header into name/value pairs. Values keep any `=` they contain.
pub fn parse_cookie_header(text: &str) -> Vec<Cookie> {
    text.trim()
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => Cookie { name: s!(name.trim()), value: s!(value) },
            None => Cookie { name: s!(pair), value: s!() },
        })
        .filter(|c| !c.name.is_empty())
        .collect()
}

pub fn load_cookies(path: &Path) -> Result<Vec<Cookie>> {
    let text = fs::read_to_string(path).map_err(|e| Error::Cookies {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let cookies = parse_cookie_header(&text);
    if cookies.is_empty() {
        return Err(Error::Cookies {
            path: path.to_path_buf(),
            reason: s!("no cookies found; paste the browser's Cookie header into this file"),
        });
    }
    logd!("Cookies: loaded {} from {}", cookies.len(), path.display());
    Ok(cookies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_pairs_and_keeps_equals_in_values() {
        let got = parse_cookie_header("_xsrf=abc; z_c0=2|1:0|10:17=; d_c0=\"AB==|1\"\n");
        assert_eq!(got.len(), 3);
        assert_eq!(got[0], Cookie { name: s!("_xsrf"), value: s!("abc") });
        assert_eq!(got[1].value, "2|1:0|10:17=");
        assert_eq!(got[2].value, "\"AB==|1\"");
    }

    #[test]
    fn tolerates_missing_space_and_empty_segments() {
        let got = parse_cookie_header("a=1;b=2;; ;flag");
        let names: Vec<&str> = got.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "flag"]);
        assert_eq!(got[2].value, "");
    }

    #[test]
    fn missing_or_empty_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("cookies");
        assert!(matches!(load_cookies(&missing), Err(Error::Cookies { .. })));

        std::fs::write(&missing, "  \n").unwrap();
        assert!(matches!(load_cookies(&missing), Err(Error::Cookies { .. })));

        std::fs::write(&missing, "a=1; b=2").unwrap();
        assert_eq!(load_cookies(&missing).unwrap().len(), 2);
    }
}
