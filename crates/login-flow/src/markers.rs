use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::driver::Marker;
use crate::error::FlowError;

/// Phrase the login surface renders when it throttles concurrent sessions.
pub const RATE_LIMIT_PHRASE: &str = "too many people";

/// Markers found present during one observation of the page.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MarkerSet {
    present: HashSet<Marker>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, marker: Marker) {
        self.present.insert(marker);
    }

    pub fn contains(&self, marker: &Marker) -> bool {
        self.present.contains(marker)
    }

    pub fn len(&self) -> usize {
        self.present.len()
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }
}

impl FromIterator<Marker> for MarkerSet {
    fn from_iter<I: IntoIterator<Item = Marker>>(iter: I) -> Self {
        Self {
            present: iter.into_iter().collect(),
        }
    }
}

/// Markers inspected on the landing page.
pub fn initial_candidates(account: &str) -> Vec<Marker> {
    vec![
        Marker::RateLimitNotice,
        Marker::ListedAccount(account.to_string()),
        Marker::IdentifierField,
        Marker::ChooserEntry,
    ]
}

/// Markers inspected once credentials have been submitted.
pub fn post_login_candidates() -> Vec<Marker> {
    vec![
        Marker::RenameField,
        Marker::ProfileConflict,
        Marker::ModalPrompt,
    ]
}

/// Branch taken from the landing page.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InitialStep {
    RateLimited,
    ClickListedAccount,
    CredentialForm,
    /// Click the first unbound chooser entry, then fill the credential form.
    PickChooserEntry,
    Unrecognized,
}

impl InitialStep {
    /// Picks the branch for the landing page; earlier rules win.
    pub fn decide(markers: &MarkerSet, account: &str) -> Self {
        if markers.contains(&Marker::RateLimitNotice) {
            InitialStep::RateLimited
        } else if markers.contains(&Marker::ListedAccount(account.to_string())) {
            InitialStep::ClickListedAccount
        } else if markers.contains(&Marker::IdentifierField) {
            InitialStep::CredentialForm
        } else if markers.contains(&Marker::ChooserEntry) {
            InitialStep::PickChooserEntry
        } else {
            InitialStep::Unrecognized
        }
    }
}

/// Interstitial handled after credentials are accepted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PostLoginStep {
    Rename,
    ResolveConflict,
    DismissModal,
}

impl PostLoginStep {
    /// Steps that apply to the observed page, in execution order. Zero, one, or
    /// several may apply.
    pub fn plan(markers: &MarkerSet) -> Vec<Self> {
        [
            PostLoginStep::Rename,
            PostLoginStep::ResolveConflict,
            PostLoginStep::DismissModal,
        ]
        .into_iter()
        .filter(|step| markers.contains(&step.trigger()))
        .collect()
    }

    /// Marker whose presence makes this step apply.
    pub fn trigger(self) -> Marker {
        match self {
            PostLoginStep::Rename => Marker::RenameField,
            PostLoginStep::ResolveConflict => Marker::ProfileConflict,
            PostLoginStep::DismissModal => Marker::ModalPrompt,
        }
    }
}

/// Reads the token out of the final page's plain text.
pub fn extract_token(text: &str) -> Result<String, FlowError> {
    if text.contains(RATE_LIMIT_PHRASE) {
        return Err(FlowError::RateLimited);
    }
    let object: Map<String, Value> = serde_json::from_str(text.trim())
        .map_err(|err| FlowError::MalformedResponse(err.to_string()))?;
    match object.get("token") {
        Some(Value::String(token)) => Ok(token.clone()),
        _ => Err(FlowError::TokenMissing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "a@x.com";

    fn set(markers: &[Marker]) -> MarkerSet {
        markers.iter().cloned().collect()
    }

    #[test]
    fn listed_account_selects_click_branch() {
        let markers = set(&[Marker::ListedAccount(ACCOUNT.into())]);
        assert_eq!(
            InitialStep::decide(&markers, ACCOUNT),
            InitialStep::ClickListedAccount
        );
    }

    #[test]
    fn credential_field_alone_selects_form() {
        let markers = set(&[Marker::IdentifierField]);
        assert_eq!(
            InitialStep::decide(&markers, ACCOUNT),
            InitialStep::CredentialForm
        );
    }

    #[test]
    fn empty_page_is_unrecognized() {
        assert_eq!(
            InitialStep::decide(&MarkerSet::new(), ACCOUNT),
            InitialStep::Unrecognized
        );
    }

    #[test]
    fn entry_for_another_account_does_not_match() {
        let markers = set(&[Marker::ListedAccount("b@x.com".into())]);
        assert_eq!(
            InitialStep::decide(&markers, ACCOUNT),
            InitialStep::Unrecognized
        );
    }

    #[test]
    fn rate_limit_wins_over_everything() {
        let markers = set(&[
            Marker::RateLimitNotice,
            Marker::ListedAccount(ACCOUNT.into()),
            Marker::IdentifierField,
        ]);
        assert_eq!(
            InitialStep::decide(&markers, ACCOUNT),
            InitialStep::RateLimited
        );
    }

    #[test]
    fn listed_account_wins_over_form_and_generic_entry() {
        let markers = set(&[
            Marker::ChooserEntry,
            Marker::IdentifierField,
            Marker::ListedAccount(ACCOUNT.into()),
        ]);
        assert_eq!(
            InitialStep::decide(&markers, ACCOUNT),
            InitialStep::ClickListedAccount
        );
    }

    #[test]
    fn generic_chooser_entry_is_last_resort() {
        let markers = set(&[Marker::ChooserEntry]);
        assert_eq!(
            InitialStep::decide(&markers, ACCOUNT),
            InitialStep::PickChooserEntry
        );
    }

    #[test]
    fn post_login_plan_keeps_fixed_order() {
        let markers = set(&[Marker::ModalPrompt, Marker::RenameField, Marker::ProfileConflict]);
        assert_eq!(
            PostLoginStep::plan(&markers),
            vec![
                PostLoginStep::Rename,
                PostLoginStep::ResolveConflict,
                PostLoginStep::DismissModal
            ]
        );
        assert!(PostLoginStep::plan(&MarkerSet::new()).is_empty());
    }

    #[test]
    fn token_is_read_from_json_object() {
        assert_eq!(extract_token("  {\"token\":\"abc123\"}\n").unwrap(), "abc123");
    }

    #[test]
    fn rate_limit_text_beats_json_parsing() {
        let err = extract_token("Sorry, too many people are logging in").unwrap_err();
        assert!(matches!(err, FlowError::RateLimited));
    }

    #[test]
    fn non_json_text_is_malformed() {
        let err = extract_token("<html>welcome</html>").unwrap_err();
        assert!(matches!(err, FlowError::MalformedResponse(_)));
    }

    #[test]
    fn json_array_is_malformed() {
        let err = extract_token("[\"token\"]").unwrap_err();
        assert!(matches!(err, FlowError::MalformedResponse(_)));
    }

    #[test]
    fn missing_or_non_string_token_is_reported() {
        assert!(matches!(
            extract_token("{\"status\":\"ok\"}").unwrap_err(),
            FlowError::TokenMissing
        ));
        assert!(matches!(
            extract_token("{\"token\":42}").unwrap_err(),
            FlowError::TokenMissing
        ));
    }
}
