use dashmap::DashMap;
use futures::future::BoxFuture;
use moor_mud_common::{Direction, LocKey, RESERVED_DIRECTION_ALIASES};
use std::sync::Arc;

use crate::combat::CombatAction;
use crate::engine::Engine;
use crate::session::SessionState;

/// Whether a command may run outside combat, only inside it, or (for
/// movement, gated inside its own handler) unconditionally at the
/// dispatcher level.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CombatGate {
    Always,
    CombatOnly,
}

#[derive(Clone)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: Vec<&'static str>,
    pub is_admin: bool,
    pub requires_auth: bool,
    pub combat_gate: CombatGate,
    pub help: &'static str,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ResultType {
    Success,
    Error,
    Info,
}

pub enum ReplyMessage {
    Loc(LocKey),
    Plain(String),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BroadcastScope {
    Room,
    Global,
}

pub struct CommandOutcome {
    pub result_type: ResultType,
    pub message: Option<ReplyMessage>,
    pub broadcast: Option<(LocKey, BroadcastScope)>,
    pub disconnect: bool,
}

impl CommandOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            result_type: ResultType::Success,
            message: Some(ReplyMessage::Plain(message.into())),
            broadcast: None,
            disconnect: false,
        }
    }

    pub fn success_loc(message: LocKey) -> Self {
        Self {
            result_type: ResultType::Success,
            message: Some(ReplyMessage::Loc(message)),
            broadcast: None,
            disconnect: false,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            result_type: ResultType::Info,
            message: Some(ReplyMessage::Plain(message.into())),
            broadcast: None,
            disconnect: false,
        }
    }

    pub fn error_loc(message: LocKey) -> Self {
        Self {
            result_type: ResultType::Error,
            message: Some(ReplyMessage::Loc(message)),
            broadcast: None,
            disconnect: false,
        }
    }

    /// A successful outcome with nothing left to say to the issuer (the
    /// handler already sent everything it needed to, e.g. `say`/`emote`
    /// fan out their own lines to each recipient).
    pub fn silent() -> Self {
        Self {
            result_type: ResultType::Success,
            message: None,
            broadcast: None,
            disconnect: false,
        }
    }

    pub fn error_plain(message: impl Into<String>) -> Self {
        Self {
            result_type: ResultType::Error,
            message: Some(ReplyMessage::Plain(message.into())),
            broadcast: None,
            disconnect: false,
        }
    }

    pub fn with_broadcast(mut self, msg: LocKey, scope: BroadcastScope) -> Self {
        self.broadcast = Some((msg, scope));
        self
    }

    pub fn with_disconnect(mut self) -> Self {
        self.disconnect = true;
        self
    }
}

pub type HandlerFn = Arc<
dyn Fn(Arc<Engine>, Arc<SessionState>, Vec<String>) -> BoxFuture<'static, CommandOutcome>
+ Send
+ Sync,
>;

/// Verb registration and dispatch. Aliases `n/s/e/w` are
/// reserved for direction movement; any other command's registration that
/// claims them has those aliases stripped with a warning.
#[derive(Default)]
pub struct CommandDispatcher {
    commands: DashMap<&'static str, (CommandSpec, HandlerFn)>,
    alias_to_name: DashMap<String, &'static str>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, mut spec: CommandSpec, handler: HandlerFn) {
        if spec.name != "north" && spec.name != "south" && spec.name != "east" && spec.name != "west" {
            let before = spec.aliases.len();
            spec.aliases
                .retain(|a| !RESERVED_DIRECTION_ALIASES.contains(a));
            if spec.aliases.len() != before {
                tracing::warn!(command = spec.name, "stripped reserved direction alias");
            }
        }
        for alias in &spec.aliases {
            self.alias_to_name.insert(alias.to_lowercase(), spec.name);
        }
        self.alias_to_name
            .insert(spec.name.to_lowercase(), spec.name);
        self.commands.insert(spec.name, (spec, handler));
    }

    pub fn lookup(&self, token: &str) -> Option<(CommandSpec, HandlerFn)> {
        let key = token.to_lowercase();
        let name = *self.alias_to_name.get(&key)?;
        self.commands.get(name).map(|e| e.value().clone())
    }

    pub fn all_specs(&self) -> Vec<CommandSpec> {
        self.commands.iter().map(|e| e.value().0.clone()).collect()
    }
}

/// Tokenizes shell-like with quote awareness (`"` and `'`, backslash
/// escapes a following quote or space); falls back to a plain whitespace
/// split if a quote is left unterminated.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    in_token = true;
                }
                '\\' if chars.peek().is_some() => {
                    current.push(chars.next().unwrap());
                    in_token = true;
                }
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }

    if quote.is_some() {
        return input.split_whitespace().map(str::to_string).collect();
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tokenize_tests {
    use super::tokenize;

    #[test]
    fn splits_quoted_phrase_as_one_token() {
        assert_eq!(
            tokenize(r#"say "hello there""#),
            vec!["say", "hello there"]
        );
    }

    #[test]
    fn falls_back_to_whitespace_split_on_unterminated_quote() {
        assert_eq!(tokenize(r#"say "hello"#), vec!["say", "\"hello"]);
    }

    #[test]
    fn plain_whitespace_tokenizes_normally() {
        assert_eq!(tokenize("attack rat"), vec!["attack", "rat"]);
    }
}

/// Runs the full dispatch pipeline for one line of input from an
/// authenticated session.
pub async fn dispatch(engine: &Arc<Engine>, session: &Arc<SessionState>, raw: &str) {
    let trimmed = raw.trim();
    session.touch();

    let effective = if trimmed == "." {
        let Some(last) = session.last_command.read().unwrap().clone() else {
            deliver_error(engine, session, LocKey::new("command.no_repeat")).await;
            return;
        };
        last
    } else {
        trimmed.to_string()
    };

    // In combat, bare "1"/"2"/"3" are shorthand for attack/defend/flee;
    // `CombatAction::parse` below already accepts these digits directly.
    let mut tokens = tokenize(&effective);
    if tokens.is_empty() {
        return;
    }
    let verb = tokens.remove(0);

    // n/s/e/w resolve exclusively to direction commands (P7), independent
    // of whatever else might be registered under those aliases.
    if let Some(dir) = Direction::parse(&verb) {
        crate::commands::movement::handle_direction(engine, session, dir).await;
        maybe_store_last_command(session, trimmed, true);
        return;
    }

    if session.in_combat() {
        if let Some(action) = CombatAction::parse(&verb) {
            handle_combat_action(session, action);
            maybe_store_last_command(session, trimmed, true);
            return;
        }
    } else if matches!(verb.to_lowercase().as_str(), "defend" | "def" | "flee") {
        deliver_error(engine, session, LocKey::new("combat.only_in_combat")).await;
        return;
    }

    let Some((spec, handler)) = engine.dispatcher.lookup(&verb) else {
        deliver_error(
            engine,
            session,
            LocKey::new("command.unknown").param("command", &verb),
        )
            .await;
        return;
    };

    if spec.combat_gate == CombatGate::CombatOnly && !session.in_combat() {
        deliver_error(engine, session, LocKey::new("combat.only_in_combat")).await;
        return;
    }
    if spec.is_admin && !session.is_admin() {
        deliver_error(engine, session, LocKey::new("command.admin_only")).await;
        return;
    }
    if spec.requires_auth && !session.is_authenticated() {
        deliver_error(engine, session, LocKey::new("command.unknown").param("command", &verb))
            .await;
        return;
    }

    engine.bus.publish(
        moor_mud_events::Event::new(moor_mud_events::EventKind::PlayerCommand)
            .with_source(session.id)
            .with_data("verb", spec.name),
    );

    let outcome = handler(engine.clone(), session.clone(), tokens).await;
    deliver_outcome(engine, session, outcome, trimmed).await;
}

/// Forwards a chosen combat action to the turn loop awaiting this
/// session's input. If no turn is currently waiting, the
/// action is silently dropped (the player spoke out of turn).
fn handle_combat_action(session: &Arc<SessionState>, action: CombatAction) {
    if let Some(tx) = session.pending_combat_action.lock().unwrap().take() {
        let _ = tx.send(action);
    }
}

async fn deliver_error(engine: &Arc<Engine>, session: &Arc<SessionState>, msg: LocKey) {
    let rendered = engine.catalog.render(&session.locale(), &msg);
    session.send_line(rendered);
}

fn maybe_store_last_command(session: &Arc<SessionState>, raw: &str, success: bool) {
    if success && raw != "." {
        *session.last_command.write().unwrap() = Some(raw.to_string());
    }
}

async fn deliver_outcome(
    engine: &Arc<Engine>,
    session: &Arc<SessionState>,
    outcome: CommandOutcome,
    raw: &str,
) {
    if let Some(message) = outcome.message {
        let rendered = match message {
            ReplyMessage::Loc(key) => engine.catalog.render(&session.locale(), &key),
            ReplyMessage::Plain(text) => text,
        };
        session.send_line(rendered);
    }
    if outcome.result_type != ResultType::Error {
        if let Some((msg, scope)) = outcome.broadcast {
            match scope {
                BroadcastScope::Room => {
                    if let Some(coords) = session.coords() {
                        engine.broadcast.broadcast_to_room(coords, msg, Some(session.id));
                    }
                }
                BroadcastScope::Global => engine.broadcast.broadcast_to_all(msg),
            }
        }
    }
    if matches!(outcome.result_type, ResultType::Success) {
        maybe_store_last_command(session, raw, true);
    }
    if outcome.disconnect {
        session.send_line("Goodbye.");
        session.request_close();
    }
}
