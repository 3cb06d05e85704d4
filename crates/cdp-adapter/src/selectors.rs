use tokenrelay_flow::Marker;

/// How a marker is found on the rendered page.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Lookup {
    Css(String),
    /// Plain substring of the page content.
    Phrase(&'static str),
}

pub fn lookup(marker: &Marker) -> Lookup {
    let css = match marker {
        Marker::RateLimitNotice => return Lookup::Phrase(tokenrelay_flow::RATE_LIMIT_PHRASE),
        Marker::ListedAccount(account) => {
            format!("li > div[data-identifier=\"{}\"]", escape_attr(account))
        }
        Marker::ChooserEntry => "li > div:not([data-identifier])".into(),
        Marker::IdentifierField => "#identifierId".into(),
        Marker::IdentifierNext => "#identifierNext > div > button".into(),
        Marker::SecretField => {
            "#password > div:nth-of-type(1) > div > div:nth-of-type(1) > input".into()
        }
        Marker::SecretNext => "#passwordNext > div > button".into(),
        Marker::RenameField => "#login-name".into(),
        Marker::RenameSubmit => concat!(
            "#modalShow > div > div > div > div > section > div > div:nth-of-type(2)",
            " > div > form > div:nth-of-type(2) > input"
        )
        .into(),
        Marker::ProfileConflict => "#profile-conflict".into(),
        Marker::ProfileConflictResolve => {
            "#profile-conflict > div:nth-of-type(3) > a > div > div:nth-of-type(2) > button".into()
        }
        Marker::ModalPrompt => "#modalShow".into(),
        Marker::ModalContinue => concat!(
            "#modalShow > div > div > div > div > section > div > div:nth-of-type(2)",
            " > div > div:nth-of-type(3) > a"
        )
        .into(),
    };
    Lookup::Css(css)
}

/// Escapes a value for use inside a double-quoted CSS attribute selector.
fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '\n' => escaped.push_str("\\a "),
            _ => escaped.push(ch),
        }
    }
    escaped
}
