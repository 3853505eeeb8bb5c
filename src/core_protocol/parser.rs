use std::collections::HashMap;

use log::debug;

/// Splits a received line into a verb and its arguments.
///
/// Two modes: positional (the session dispatch uses this) and flag-based
/// (`-key value`, a boolean flag when no value follows). One parser instance
/// lives on each session and is refilled per received line.
#[derive(Debug, Default)]
pub struct Parser {
    cmd: String,
    args: Vec<String>,
    options: HashMap<String, Option<String>>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional mode: first token is the verb, the rest are arguments.
    pub fn parse(&mut self, line: &str) {
        debug!("Parsing cmd: {}", line);
        self.options.clear();
        let mut tokens = line.split(' ');
        self.cmd = tokens.next().unwrap_or_default().to_string();
        self.args = tokens.map(str::to_string).collect();
    }

    /// Flag mode: tokens starting with `-` become keys; the following token
    /// is the value unless it starts with `-` itself, in which case the flag
    /// is boolean.
    pub fn parse_with_options(&mut self, line: &str) {
        debug!("Parsing cmd with options: {}", line);
        self.args.clear();
        self.options.clear();
        // split() always yields at least one token
        let tokens: Vec<&str> = line.split(' ').collect();
        self.cmd = tokens[0].to_string();
        let rest = &tokens[1..];
        let mut i = 0;
        while i < rest.len() {
            if rest[i].starts_with('-') {
                match rest.get(i + 1) {
                    Some(next) if !next.starts_with('-') => {
                        self.options
                            .insert(rest[i].to_string(), Some(next.to_string()));
                        i += 2;
                        continue;
                    }
                    _ => {
                        self.options.insert(rest[i].to_string(), None);
                    }
                }
            }
            i += 1;
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// `Some(Some(value))` for `-key value`, `Some(None)` for a boolean flag.
    pub fn option(&self, key: &str) -> Option<&Option<String>> {
        self.options.get(key)
    }

    /// Exact positional argument count check; every handler's first action.
    pub fn check_args(&self, amount: usize) -> bool {
        self.args.len() == amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positional_arguments() {
        let mut parser = Parser::new();
        parser.parse("download files/1 files/2");
        assert_eq!(parser.cmd(), "download");
        assert_eq!(parser.args(), ["files/1", "files/2"]);
        assert!(parser.check_args(2));
        assert!(!parser.check_args(0));
    }

    #[test]
    fn parses_bare_verb() {
        let mut parser = Parser::new();
        parser.parse("logout");
        assert_eq!(parser.cmd(), "logout");
        assert!(parser.check_args(0));
    }

    #[test]
    fn parses_flag_values_and_boolean_flags() {
        let mut parser = Parser::new();
        parser.parse_with_options("download -r files/a.jpg -l files/b.jpg -v");
        assert_eq!(parser.cmd(), "download");
        assert_eq!(
            parser.option("-r"),
            Some(&Some("files/a.jpg".to_string()))
        );
        assert_eq!(
            parser.option("-l"),
            Some(&Some("files/b.jpg".to_string()))
        );
        assert_eq!(parser.option("-v"), Some(&None));
        assert_eq!(parser.option("-x"), None);
    }

    #[test]
    fn flag_followed_by_flag_is_boolean() {
        let mut parser = Parser::new();
        parser.parse_with_options("cmd -a -b value");
        assert_eq!(parser.option("-a"), Some(&None));
        assert_eq!(parser.option("-b"), Some(&Some("value".to_string())));
    }

    #[test]
    fn reparsing_replaces_previous_state() {
        let mut parser = Parser::new();
        parser.parse("mkdir somedir");
        parser.parse("time");
        assert_eq!(parser.cmd(), "time");
        assert!(parser.check_args(0));
    }
}
