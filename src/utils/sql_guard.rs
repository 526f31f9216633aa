//! Read-only guard for SQL produced by the model.

use once_cell::sync::Lazy;
use regex::Regex;
use std::iter::Peekable;
use std::str::Chars;

const READ_PREFIXES: [&str; 5] = ["SELECT", "WITH", "SHOW", "DESCRIBE", "EXPLAIN"];

static FORBIDDEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(INSERT|UPDATE|DELETE|MERGE|DROP|ALTER|CREATE|TRUNCATE|RENAME|GRANT|REVOKE|CALL|EXEC|EXECUTE|LOCK|UNLOCK|HANDLER|LOAD|OUTFILE|DUMPFILE)\b",
    )
    .expect("forbidden keyword pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlRejection {
    Empty,
    NotReadOnly,
    MultipleStatements,
    ExecutableComment,
    Forbidden(String),
}

impl std::fmt::Display for SqlRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlRejection::Empty => write!(f, "empty query"),
            SqlRejection::NotReadOnly => write!(
                f,
                "only {} statements are allowed",
                READ_PREFIXES.join("/")
            ),
            SqlRejection::MultipleStatements => write!(f, "only a single statement is allowed"),
            SqlRejection::ExecutableComment => {
                write!(f, "versioned /*! */ comments are not allowed")
            }
            SqlRejection::Forbidden(keyword) => write!(f, "forbidden keyword: {}", keyword),
        }
    }
}

/// 去掉末尾分号，返回可直接执行的语句
pub fn ensure_read_only(sql: &str) -> Result<String, SqlRejection> {
    let statement = sql.trim().trim_end_matches(';').trim();
    if statement.is_empty() {
        return Err(SqlRejection::Empty);
    }

    // Literals and comments may legitimately contain keywords or ';'
    let masked = mask_literals_and_comments(statement)?;
    let stripped = masked.trim();

    let upper = stripped.to_uppercase();
    let first_word = upper
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default();
    if !READ_PREFIXES.contains(&first_word) {
        return Err(SqlRejection::NotReadOnly);
    }

    if stripped.contains(';') {
        return Err(SqlRejection::MultipleStatements);
    }

    if let Some(hit) = FORBIDDEN.find(stripped) {
        return Err(SqlRejection::Forbidden(hit.as_str().to_uppercase()));
    }

    Ok(statement.to_string())
}

/// 单次扫描：字符串/标识符替换为 `''`，注释替换为空格。
/// 注释起始符出现在字面量内时不生效，与 MySQL 词法一致。
fn mask_literals_and_comments(sql: &str) -> Result<String, SqlRejection> {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                skip_quoted(&mut chars, c);
                out.push_str("''");
            }
            '#' => {
                skip_line(&mut chars);
                out.push(' ');
            }
            // MySQL only treats `--` as a comment when followed by whitespace
            '-' if chars.peek() == Some(&'-') => {
                let mut lookahead = chars.clone();
                lookahead.next();
                match lookahead.peek() {
                    None => {
                        chars.next();
                        out.push(' ');
                    }
                    Some(next) if next.is_whitespace() => {
                        skip_line(&mut chars);
                        out.push(' ');
                    }
                    Some(_) => out.push(c),
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                // `/*! ... */` bodies are executed by MySQL
                if chars.peek() == Some(&'!') {
                    return Err(SqlRejection::ExecutableComment);
                }
                skip_block_comment(&mut chars);
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

fn skip_quoted(chars: &mut Peekable<Chars<'_>>, quote: char) {
    while let Some(c) = chars.next() {
        if c == '\\' && quote != '`' {
            chars.next();
        } else if c == quote {
            // doubled quote is an escaped quote
            if chars.peek() == Some(&quote) {
                chars.next();
            } else {
                return;
            }
        }
    }
}

fn skip_line(chars: &mut Peekable<Chars<'_>>) {
    for c in chars.by_ref() {
        if c == '\n' {
            return;
        }
    }
}

fn skip_block_comment(chars: &mut Peekable<Chars<'_>>) {
    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'/') {
            chars.next();
            return;
        }
    }
}
