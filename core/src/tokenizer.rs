use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref LINK_RE: Regex =
        Regex::new(r"(?i)\S*(?:https?://|www\.)\S*|\S+\.(?:com|org|net)\S*|\S*@\S*")
            .expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Normalizes raw text into index terms: links and handles stripped,
/// NFKC-normalized, lowercased, stopwords removed, stemmed.
///
/// The indexing and scoring layers consume this output; they perform no
/// normalization of their own.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned = LINK_RE.replace_all(text, " ");
    let normalized = cleaned.nfkc().collect::<String>().to_lowercase();
    TOKEN_RE
        .find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|token| !is_stopword(token))
        .map(|token| STEMMER.stem(token).to_string())
        .collect()
}

/// Tokenizes and rejoins, for pre-normalizing a crawled text field.
pub fn normalize(text: &str) -> String {
    tokenize(text).join(" ")
}

/// Pre-normalizes every entry of a crawled list field.
pub fn normalize_field(values: &[String]) -> Vec<String> {
    values.iter().map(|v| normalize(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let tokens = tokenize("Running, runner's run!");
        assert!(tokens.iter().any(|w| w == "run"));
    }

    #[test]
    fn strips_links_and_handles() {
        let tokens = tokenize("watch https://example.com/trailer or email press@studio.org now");
        assert!(tokens.iter().all(|w| !w.contains("example")));
        assert!(tokens.iter().all(|w| !w.contains("studio")));
        assert!(tokens.iter().any(|w| w == "watch"));
    }
}
