//! Source URL selection
//!
//! The API offers several interchangeable CDN sources per channel. A
//! preferred-source substring pins a known source (first match in API
//! order); otherwise one source is drawn uniformly at random.

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::debug;

/// Pick one URL out of `candidates`.
///
/// Returns `None` only when `candidates` is empty.
pub fn select_source<'a, S, R>(
    candidates: &'a [S],
    preferred: Option<&str>,
    rng: &mut R,
) -> Option<&'a str>
where
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    if let Some(pref) = preferred {
        if let Some(hit) = candidates.iter().find(|c| c.as_ref().contains(pref)) {
            return Some(hit.as_ref());
        }
        if !candidates.is_empty() {
            debug!("No source matches preference '{}', picking at random", pref);
        }
    }

    candidates.choose(rng).map(|c| c.as_ref())
}

/// Append `listen_key=<token>` to a stream URL
pub fn with_listen_key(url: &str, listen_key: Option<&str>) -> String {
    let Some(key) = listen_key else {
        return url.to_string();
    };

    match url::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.query_pairs_mut().append_pair("listen_key", key);
            parsed.to_string()
        }
        Err(_) => {
            let sep = if url.contains('?') { '&' } else { '?' };
            format!("{url}{sep}listen_key={key}")
        }
    }
}
