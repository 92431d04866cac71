use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A locale is an opaque tag to the core; string
/// tables and the actual translations live outside this crate. `en` is the
/// fallback for any key missing in another supported locale.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct Locale(pub String);

impl Locale {
    pub const DEFAULT: &'static str = "en";

    pub fn new(tag: impl Into<String>) -> Self {
        Locale(tag.into())
    }

    pub fn default_locale() -> Self {
        Locale(Self::DEFAULT.to_string())
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::default_locale()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-locale fixed text, e.g. a room's description table or an object's
/// localized name. Falls back to `en`, then to the literal key as a last
/// resort so a missing translation never produces an empty line.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LocalizedText(pub HashMap<String, String>);

impl LocalizedText {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn with(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.0.insert(locale.into(), text.into());
        self
    }

    pub fn get(&self, locale: &Locale) -> &str {
        self.0
            .get(&locale.0)
            .or_else(|| self.0.get(Locale::DEFAULT))
            .map(String::as_str)
            .unwrap_or("???")
    }
}

/// A message to be rendered for a specific recipient's locale. Broadcasts
/// and replies carry this structure rather than a pre-rendered string, so
/// mixed-locale rooms render correctly for every occupant.
#[derive(Clone, Debug)]
pub struct LocKey {
    pub key: &'static str,
    pub params: HashMap<String, String>,
}

impl LocKey {
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            params: HashMap::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }
}

/// Looks up and substitutes a localized message. The core treats this as an
/// opaque lookup function; the default table below carries the
/// system messages the core itself emits (auth, movement, combat narration,
/// errors).
pub trait MessageCatalog: Send + Sync {
    fn render(&self, locale: &Locale, msg: &LocKey) -> String;
}

/// Built-in catalog covering the core engine's own system messages in
/// English and Korean. A deployment may substitute its own `MessageCatalog`
/// for content-layer strings (quest text, shop dialogue) without touching
/// the core.
pub struct DefaultCatalog {
    table: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl DefaultCatalog {
    pub fn new() -> Self {
        let mut table: HashMap<&'static str, HashMap<&'static str, &'static str>> =
        HashMap::new();
        macro_rules! msg {
            ($key:literal, en = $en:literal, ko = $ko:literal) => {
                table.insert($key, HashMap::from([("en", $en), ("ko", $ko)]));
            };
        }
        msg!("auth.login_success", en = "\u{2705} Welcome, {username}!", ko = "\u{2705} '{username}'님, 환영합니다!");
        msg!("auth.login_failed", en = "\u{274c} Invalid username or password.", ko = "\u{274c} 잘못된 정보입니다.");
        msg!("auth.already_logged_in", en = "\u{274c} That account is already logged in elsewhere.", ko = "\u{274c} 이미 로그인된 계정입니다.");
        msg!("auth.logged_in_elsewhere", en = "\u{274c} You have been logged in from another location.", ko = "\u{274c} 다른 위치에서 로그인되었습니다.");
        msg!("movement.no_exit", en = "\u{274c} You cannot go {direction}.", ko = "\u{274c} {direction} 방향으로는 갈 수 없습니다.");
        msg!("movement.in_combat", en = "\u{274c} You cannot move while in combat.", ko = "\u{274c} 전투 중에는 이동할 수 없습니다.");
        msg!("movement.left", en = "{name} leaves {direction}.", ko = "{name}님이 {direction}으로 떠났습니다.");
        msg!("movement.entered", en = "{name} arrives from {direction}.", ko = "{name}님이 {direction}에서 도착했습니다.");
        msg!("movement.follow_start", en = "You follow {leader}.", ko = "{leader}님을 따라갑니다.");
        msg!("movement.follow_stopped", en = "You stop following {leader}.", ko = "{leader}님 따라가기를 멈춥니다.");
        msg!("movement.follow_failed", en = "\u{274c} {leader} could not go that way; you stop following.", ko = "\u{274c} {leader}님이 이동할 수 없어 따라가기를 멈추었습니다.");
        msg!("combat.start", en = "\u{2694}️ Combat started with {monster}!", ko = "\u{2694}️ {monster}와(과) 전투를 시작합니다!");
        msg!("combat.victory", en = "\u{1f389} Victory! You defeated {monster}!", ko = "\u{1f389} 승리! {monster}을(를) 처치했습니다!");
        msg!("combat.defeat", en = "\u{1f480} You were defeated...", ko = "\u{1f480} 전투에서 패배했습니다...");
        msg!("combat.attack_hit", en = "\u{2705} Hit! {damage} damage to {target}!", ko = "\u{2705} 명중! {target}에게 {damage} 데미지!");
        msg!("combat.attack_miss", en = "\u{274c} {actor} missed {target}!", ko = "\u{274c} {actor}이(가) {target}을(를) 빗나갔습니다!");
        msg!("combat.defend", en = "{actor} takes a defensive stance.", ko = "{actor}이(가) 방어 자세를 취했습니다.");
        msg!("combat.flee_success", en = "\u{1f4a8} {actor} fled from combat!", ko = "\u{1f4a8} {actor}이(가) 전투에서 도망쳤습니다!");
        msg!("combat.flee_failed", en = "\u{274c} {actor} failed to flee!", ko = "\u{274c} {actor}이(가) 도망에 실패했습니다!");
        msg!("combat.aggro", en = "{monster} attacks {target}!", ko = "{monster}가 {target}을(를) 공격합니다!");
        msg!("combat.only_in_combat", en = "\u{274c} You are not in combat.", ko = "\u{274c} 전투 중이 아닙니다.");
        msg!("command.unknown", en = "\u{274c} Unknown command: {command}", ko = "\u{274c} 알 수 없는 명령어: {command}");
        msg!("command.admin_only", en = "\u{274c} This command is for administrators only.", ko = "\u{274c} 관리자 전용 명령어입니다.");
        msg!("command.no_repeat", en = "\u{274c} No previous command to repeat.", ko = "\u{274c} 반복할 이전 명령어가 없습니다.");
        msg!("name.invalid", en = "\u{274c} Names must be 3-20 characters (letters, digits, spaces, or Hangul).", ko = "\u{274c} 이름은 3-20자의 한글, 영다, 숫자, 공백만 사용할 수 있습니다.");
        msg!("name.rate_limited", en = "\u{274c} You must wait {hours} more hour(s) before changing your name again.", ko = "\u{274c} 이름 변경까지 {hours}시간 더 기다려야 합니다.");
        msg!("error.generic", en = "\u{274c} An error occurred.", ko = "\u{274c} 오류가 발생했습니다.");
        msg!("time.dawn", en = "\u{2600}️ The sun rises.", ko = "\u{2600}️ 해가 떠오릅니다.");
        msg!("time.dusk", en = "\u{1f319} Night falls.", ko = "\u{1f319} 밤이 찾아옵니다.");
        Self { table }
    }
}

impl Default for DefaultCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageCatalog for DefaultCatalog {
    fn render(&self, locale: &Locale, msg: &LocKey) -> String {
        let Some(by_locale) = self.table.get(msg.key) else {
            tracing::warn!(key = msg.key, "missing message key in catalog");
            return format!("[missing message: {}]", msg.key);
        };
        let template = by_locale
            .get(locale.0.as_str())
            .or_else(|| by_locale.get(Locale::DEFAULT))
            .copied()
            .unwrap_or("???");
        substitute(template, &msg.params)
    }
}

fn substitute(template: &str, params: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = template[i..].find('}') {
                let name = &template[i + 1..i + end];
                if let Some(value) = params.get(name) {
                    out.push_str(value);
                    i += end + 1;
                    continue;
                }
            }
        }
        let ch = template[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    let _ = &mut chars;
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_placeholders_and_leaves_unknown() {
        let mut params = HashMap::new();
        params.insert("username".to_string(), "alice".to_string());
        let out = substitute("Welcome, {username}! ({missing})", &params);
        assert_eq!(out, "Welcome, alice! ({missing})");
    }

    #[test]
    fn falls_back_to_default_locale() {
        let cat = DefaultCatalog::new();
        let msg = LocKey::new("auth.login_success").param("username", "alice");
        let rendered = cat.render(&Locale::new("fr"), &msg);
        assert_eq!(rendered, "\u{2705} Welcome, alice!");
    }

    #[test]
    fn renders_korean_locale() {
        let cat = DefaultCatalog::new();
        let msg = LocKey::new("combat.victory").param("monster", "rat");
        let rendered = cat.render(&Locale::new("ko"), &msg);
        assert!(rendered.contains("rat"));
    }
}
