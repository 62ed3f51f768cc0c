#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    pub fn is_write(self) -> bool {
        matches!(
            self,
            StatementKind::Insert | StatementKind::Update | StatementKind::Delete
        )
    }
}

/// One delimited SQL command from a source file. The text is kept verbatim
/// minus the trailing terminator so the writer can replay it unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub text: String,
    pub position: usize,
    pub kind: StatementKind,
}

impl Statement {
    pub fn new(text: String, position: usize) -> Statement {
        let kind = classify(&text);
        Statement {
            text,
            position,
            kind,
        }
    }
}

fn classify(text: &str) -> StatementKind {
    match leading_keyword(text) {
        Some(word) if word.eq_ignore_ascii_case("select") => StatementKind::Select,
        Some(word) if word.eq_ignore_ascii_case("insert") => StatementKind::Insert,
        Some(word) if word.eq_ignore_ascii_case("update") => StatementKind::Update,
        Some(word) if word.eq_ignore_ascii_case("delete") => StatementKind::Delete,
        _ => StatementKind::Other,
    }
}

/// First keyword of the statement, skipping leading whitespace and comments.
fn leading_keyword(text: &str) -> Option<&str> {
    let mut rest = text;
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("--") {
            rest = match after.find('\n') {
                Some(pos) => &after[pos + 1..],
                None => "",
            };
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = match after.find("*/") {
                Some(pos) => &after[pos + 2..],
                None => "",
            };
        } else {
            break;
        }
    }

    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or_else(|| rest.len());
    if end == 0 {
        None
    } else {
        Some(&rest[..end])
    }
}
