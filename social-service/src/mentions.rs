//! `@username` mention extraction and resolution.
use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use social_shared::types::{PendingNotification, UserId, Verb};
use tracing::debug;

use crate::errors::SocialError;
use crate::service::SocialService;

lazy_static! {
    // `@` must open the text or follow a character that cannot be part of a
    // username, so e-mail addresses do not count as mentions. The token takes
    // the whole username alphabet, `@` included.
    static ref MENTION_REGEX: Regex =
        Regex::new(r"(?:^|[^A-Za-z0-9@.+_-])@([A-Za-z0-9@.+_-]+)").unwrap();
}

const MAX_USERNAME_LEN: usize = 150;

/// Returns the distinct mention tokens in `text`, in order of first
/// appearance. Trailing dots are treated as sentence punctuation.
fn extract_mentions(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for captures in MENTION_REGEX.captures_iter(text) {
        let token = captures[1].trim_end_matches('.');
        if token.is_empty() {
            continue;
        }
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Usernames a token may refer to, longest first: the token itself, then each
/// prefix ending before one of its `@`. `@bob@work` names `bob@work` if that
/// account exists, otherwise `bob`.
fn candidates(token: &str) -> Vec<&str> {
    let mut names = vec![token];
    let cuts: Vec<usize> = token.match_indices('@').map(|(i, _)| i).collect();
    names.extend(cuts.into_iter().rev().map(|i| &token[..i]));
    names.retain(|name| !name.is_empty() && name.len() <= MAX_USERNAME_LEN);
    names
}

impl SocialService {
    /// Resolves the users mentioned in `text` into mention notifications.
    ///
    /// Each token resolves to the longest candidate username that exists.
    /// Unknown names are ignored, every user is notified at most once and the
    /// author mentioning themselves is skipped.
    pub(crate) async fn mention_notifications(
        &self,
        actor_id: UserId,
        text: &str,
    ) -> Result<Vec<PendingNotification>, SocialError> {
        let tokens = extract_mentions(text);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let lookup: Vec<String> = tokens
            .iter()
            .flat_map(|token| candidates(token))
            .map(str::to_string)
            .collect();
        let users = self.repo.get_users_by_usernames(&lookup).await?;
        let ids: HashMap<&str, UserId> = users
            .iter()
            .map(|u| (u.username.as_str(), u.id))
            .collect();

        let mut pending: Vec<PendingNotification> = Vec::new();
        for token in &tokens {
            let Some(recipient_id) = candidates(token)
                .into_iter()
                .find_map(|name| ids.get(name).copied())
            else {
                continue;
            };
            if recipient_id == actor_id || pending.iter().any(|p| p.recipient_id == recipient_id)
            {
                continue;
            }
            pending.push(PendingNotification {
                recipient_id,
                verb: Verb::Mention,
            });
        }

        debug!(
            actor_id = %actor_id,
            tokens = tokens.len(),
            mentioned = pending.len(),
            "Mentions resolved"
        );
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_distinct_tokens_in_order() {
        assert_eq!(
            extract_mentions("@bob hi @alice, and @bob again"),
            vec!["bob".to_string(), "alice".to_string()]
        );
    }

    #[test]
    fn test_ignores_email_addresses_and_bare_at() {
        assert!(extract_mentions("mail me at bob@example.com").is_empty());
        assert!(extract_mentions("meet @ noon").is_empty());
    }

    #[test]
    fn test_strips_sentence_punctuation() {
        assert_eq!(
            extract_mentions("Thanks @carol."),
            vec!["carol".to_string()]
        );
        assert_eq!(
            extract_mentions("(@dave_99) and @e.v-e+x!"),
            vec!["dave_99".to_string(), "e.v-e+x".to_string()]
        );
    }

    #[test]
    fn test_token_keeps_at_signs_inside_usernames() {
        assert_eq!(
            extract_mentions("ping @bob@work now"),
            vec!["bob@work".to_string()]
        );
    }

    #[test]
    fn test_candidates_run_longest_first() {
        assert_eq!(candidates("bob@work"), vec!["bob@work", "bob"]);
        assert_eq!(candidates("a@b@c"), vec!["a@b@c", "a@b", "a"]);
        assert_eq!(candidates("bob@"), vec!["bob@", "bob"]);
        assert_eq!(candidates("carol"), vec!["carol"]);
        assert!(candidates(&"x".repeat(151)).is_empty());
    }
}
