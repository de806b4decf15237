use chumsky::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // databases
    Databases,

    // create <db>
    Create(String),

    // use <db>
    Use(String),

    // drop <db>
    Drop(String),

    // keys
    Keys,

    // get <key>
    Get(String),

    // exists <key>
    Exists(String),

    // insert <key> <json>
    Insert(String, String),

    // modify <key> <json>
    Modify(String, String),

    // delete <key>
    Delete(String),

    // clear
    Clear,

    // import <csv-path>
    Import(String),

    Help,

    Exit,
}

pub fn parser<'a>() -> impl Parser<'a, &'a str, Command, extra::Err<Rich<'a, char>>> {
    fn word<'a>() -> impl Parser<'a, &'a str, String, extra::Err<Rich<'a, char>>> + Clone {
        none_of(" \t\r\n")
            .repeated()
            .at_least(1)
            .to_slice()
            .map(|s: &str| s.to_string())
    }

    // Everything up to the end of the line, JSON included
    fn rest<'a>() -> impl Parser<'a, &'a str, String, extra::Err<Rich<'a, char>>> + Clone {
        any()
            .repeated()
            .at_least(1)
            .to_slice()
            .map(|s: &str| s.trim_end().to_string())
    }

    fn with_arg<'a>(
        keyword: &'static str,
    ) -> impl Parser<'a, &'a str, String, extra::Err<Rich<'a, char>>> + Clone {
        just(keyword)
            .ignore_then(text::whitespace().at_least(1))
            .ignore_then(word())
    }

    fn with_value<'a>(
        keyword: &'static str,
    ) -> impl Parser<'a, &'a str, (String, String), extra::Err<Rich<'a, char>>> + Clone {
        with_arg(keyword)
            .then_ignore(text::whitespace().at_least(1))
            .then(rest())
    }

    let catalog = choice((
        just("databases").to(Command::Databases),
        with_arg("create").map(Command::Create),
        with_arg("use").map(Command::Use),
        with_arg("drop").map(Command::Drop),
    ));

    let records = choice((
        just("keys").to(Command::Keys),
        with_arg("get").map(Command::Get),
        with_arg("exists").map(Command::Exists),
        with_value("insert").map(|(key, json)| Command::Insert(key, json)),
        with_value("modify").map(|(key, json)| Command::Modify(key, json)),
        with_arg("delete").map(Command::Delete),
        just("clear").to(Command::Clear),
        with_arg("import").map(Command::Import),
    ));

    let session = choice((
        just("help").to(Command::Help),
        just("exit").to(Command::Exit),
    ));

    choice((catalog, records, session))
        .padded()
        .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        parser().parse(line).into_result().unwrap()
    }

    #[test]
    fn test_catalog_commands() {
        assert_eq!(parse("databases"), Command::Databases);
        assert_eq!(parse("create users"), Command::Create("users".into()));
        assert_eq!(parse("  use   users  "), Command::Use("users".into()));
        assert_eq!(parse("drop users"), Command::Drop("users".into()));
    }

    #[test]
    fn test_record_commands() {
        assert_eq!(parse("keys"), Command::Keys);
        assert_eq!(parse("get alice"), Command::Get("alice".into()));
        assert_eq!(parse("exists alice"), Command::Exists("alice".into()));
        assert_eq!(parse("delete alice"), Command::Delete("alice".into()));
        assert_eq!(parse("clear"), Command::Clear);
        assert_eq!(
            parse("import data/people.csv"),
            Command::Import("data/people.csv".into())
        );
        assert_eq!(parse("help"), Command::Help);
        assert_eq!(parse("exit"), Command::Exit);
    }

    #[test]
    fn test_json_argument_keeps_spaces() {
        assert_eq!(
            parse(r#"insert alice {"name": "Alice Smith", "age": 30}"#),
            Command::Insert("alice".into(), r#"{"name": "Alice Smith", "age": 30}"#.into())
        );
        assert_eq!(
            parse("modify n 42  "),
            Command::Modify("n".into(), "42".into())
        );
    }

    #[test]
    fn test_names_are_not_validated_here() {
        // The engine rejects these with InvalidName
        assert_eq!(parse("create a.b"), Command::Create("a.b".into()));
        assert_eq!(parse("get é"), Command::Get("é".into()));
    }

    #[test]
    fn test_parse_errors() {
        for line in ["", "create", "insert alice", "keys extra", "select * from t", "usex"] {
            assert!(parser().parse(line).has_errors(), "{:?} should not parse", line);
        }
    }
}
