//! Per-pattern phrase lists. All entries are lowercase.

use patternsense_protocols::Pattern;

/// Phrase lists for one pattern.
#[derive(Debug, Clone, Copy)]
pub struct Lexicon {
    pub strong: &'static [&'static str],
    pub medium: &'static [&'static str],
    /// Matched only against placeholders and labels.
    pub placeholder: &'static [&'static str],
    /// Matched only against button texts.
    pub button: &'static [&'static str],
    pub negative: &'static [&'static str],
}

pub fn lexicon(pattern: Pattern) -> &'static Lexicon {
    match pattern {
        Pattern::Chat => &CHAT,
        Pattern::Form => &FORM,
        Pattern::Dropdown => &DROPDOWN,
        Pattern::Modal => &MODAL,
        Pattern::Login => &LOGIN,
        Pattern::Search => &SEARCH,
        Pattern::Feed => &FEED,
        Pattern::CookieBanner => &COOKIE_BANNER,
    }
}

static CHAT: Lexicon = Lexicon {
    strong: &["type a message", "send a message", "start a conversation", "chat with"],
    medium: &["message", "conversation", "reply", "assistant", "online", "typing"],
    placeholder: &["message", "ask anything", "type here", "write a reply", "say something"],
    button: &["send", "reply"],
    negative: &["password", "subscribe to our newsletter"],
};

static FORM: Lexicon = Lexicon {
    strong: &["required field", "please fill", "fill out", "contact us"],
    medium: &["name", "email", "phone", "address", "details", "required"],
    placeholder: &["email", "name", "phone", "address", "your"],
    button: &["submit", "save", "continue", "next", "register", "send"],
    negative: &["search", "password"],
};

static DROPDOWN: Lexicon = Lexicon {
    strong: &["select an option", "choose an option", "please select"],
    medium: &["select", "choose", "options", "menu", "more"],
    placeholder: &["select", "choose"],
    button: &["menu", "more", "options", "select"],
    negative: &["type a message"],
};

static MODAL: Lexicon = Lexicon {
    strong: &["are you sure", "confirm", "close dialog"],
    medium: &["close", "cancel", "dismiss", "ok", "got it"],
    placeholder: &[],
    button: &["close", "cancel", "ok", "confirm", "dismiss", "\u{00d7}"],
    negative: &["cookie", "search results"],
};

static LOGIN: Lexicon = Lexicon {
    strong: &["sign in", "log in", "login", "forgot password", "forgot your password"],
    medium: &["password", "username", "remember me", "account", "email"],
    placeholder: &["password", "username", "email", "phone or email"],
    button: &["sign in", "log in", "login", "continue"],
    negative: &["create account", "sign up", "register", "newsletter"],
};

static SEARCH: Lexicon = Lexicon {
    strong: &["search for", "search results", "what are you looking for"],
    medium: &["search", "find", "filter", "looking for"],
    placeholder: &["search", "find", "looking for"],
    button: &["search", "go", "find"],
    negative: &["password", "type a message"],
};

static FEED: Lexicon = Lexicon {
    strong: &["load more", "show more posts", "see more", "older posts"],
    medium: &["posted", "ago", "like", "comment", "share", "follow", "read more"],
    placeholder: &[],
    button: &["load more", "show more", "see more"],
    negative: &["password", "checkout"],
};

static COOKIE_BANNER: Lexicon = Lexicon {
    strong: &["we use cookies", "cookie policy", "cookie settings", "accept all cookies"],
    medium: &["cookies", "cookie", "consent", "privacy", "tracking", "gdpr"],
    placeholder: &[],
    button: &["accept", "accept all", "reject", "reject all", "decline", "agree", "allow", "manage"],
    negative: &["password", "type a message"],
};
