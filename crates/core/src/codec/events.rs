//! Line-oriented grammar of the events file.
//!
//! ```text
//! vars: {
//! 	player: 0,
//! },
//! event: {
//! 	eventID: PATH_EVENT_SetAdvantageEnemy_0xff1a03
//! 	actions:[
//! 		if(vars['player']==0) #0
//! 		branchto(node=112, ofsection=-1, immediate=false) #0
//! 		else #0
//! 		vars['variation']%=2 #0
//! 		end if
//! 	],
//! },
//! ```
//!
//! Every action line ends in `#<track>`. An `if` opens a chain that
//! `else if` / `else` continue and `end if` closes; the body of each link is
//! closed implicitly when the next link starts. The dumper writes exactly one
//! `end if` per chain, after the body of its last link.

use crate::{
    model::{
        event_id_from_name, Action, ArithmeticOp, BranchTo, Calculate, Comparison, Condition,
        Conditional, ElseBlock, Event, Fade, Operand, SetValue, Track, Variable, WaitDuration,
        WaitTime,
    },
    PathMusicError, Result,
};

/// Variables and events read from an events file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDocument {
    pub variables: Vec<Variable>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Vars,
    EndVars,
    Event,
    Actions,
    EndActions,
    EndEvent,
}

/// Header of the conditional whose body a frame collects.
#[derive(Debug)]
enum Opener {
    If(Condition, usize),
    ElseIf(Condition, usize),
    Else(usize),
}

#[derive(Debug)]
struct Frame {
    opener: Option<Opener>,
    actions: Vec<Action>,
}

impl Frame {
    fn root() -> Self {
        Self {
            opener: None,
            actions: Vec::new(),
        }
    }

    fn open(opener: Opener) -> Self {
        Self {
            opener: Some(opener),
            actions: Vec::new(),
        }
    }

    fn close(self) -> Option<Action> {
        let actions = self.actions;
        Some(match self.opener? {
            Opener::If(condition, track) => Action::If(Conditional {
                condition,
                actions,
                track,
            }),
            Opener::ElseIf(condition, track) => Action::ElseIf(Conditional {
                condition,
                actions,
                track,
            }),
            Opener::Else(track) => Action::Else(ElseBlock { actions, track }),
        })
    }
}

struct EventParser<'a> {
    track_count: usize,
    line_no: usize,
    line: &'a str,
    state: State,
    document: EventDocument,
    pending: Option<(String, i64)>,
    stack: Vec<Frame>,
}

/// Parses the events file. `tracks` bounds the `#<track>` comments.
pub fn parse_events(source: &str, tracks: &[Track]) -> Result<EventDocument> {
    let mut parser = EventParser {
        track_count: tracks.len(),
        line_no: 0,
        line: "",
        state: State::None,
        document: EventDocument::default(),
        pending: None,
        stack: Vec::new(),
    };
    for (index, raw) in source.split('\n').enumerate() {
        parser.line_no = index + 1;
        parser.line = raw.strip_suffix('\r').unwrap_or(raw);
        parser.step()?;
    }
    parser.finish()
}

impl<'a> EventParser<'a> {
    fn error(&self, message: impl Into<String>) -> PathMusicError {
        PathMusicError::parse(self.line_no, self.line, message)
    }

    fn step(&mut self) -> Result<()> {
        let line = self.line;
        let blank = line.trim().is_empty();
        match self.state {
            State::None => {
                if let Some(rest) = line.strip_prefix("vars:") {
                    self.state = if rest.contains('}') {
                        self.inline_variables(rest)?;
                        State::EndVars
                    } else if rest.trim() == "{" {
                        State::Vars
                    } else {
                        return Err(self.error("expected '{' after 'vars:'"));
                    };
                } else if line.starts_with("event:") {
                    self.state = State::Event;
                } else {
                    return Err(self.error("expected 'vars' or 'event'"));
                }
            }
            State::Vars => {
                if line.starts_with('}') {
                    self.state = State::EndVars;
                } else if !blank {
                    let variable = self.variable(line)?;
                    self.document.variables.push(variable);
                }
            }
            State::EndVars | State::EndEvent => {
                if line.starts_with("event:") {
                    self.state = State::Event;
                } else if !blank {
                    return Err(self.error("expected 'event'"));
                }
            }
            State::Event => self.event_header()?,
            State::Actions => self.action_line()?,
            State::EndActions => {
                if !line.starts_with('}') {
                    return Err(self.error("expected '}' closing the event"));
                }
                self.state = State::EndEvent;
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<EventDocument> {
        match self.state {
            State::EndVars | State::EndEvent => {
                tracing::debug!(
                    variables = self.document.variables.len(),
                    events = self.document.events.len(),
                    "parsed events"
                );
                Ok(self.document)
            }
            State::Actions => Err(self.error("unterminated action list")),
            State::Vars => Err(self.error("unterminated vars block")),
            _ => Err(self.error("unterminated event block")),
        }
    }

    /// Reads a whole block written on one line, `vars: { a: 1, b: 2 },`.
    fn inline_variables(&mut self, rest: &str) -> Result<()> {
        let inner = rest
            .trim()
            .trim_end_matches(',')
            .trim_end()
            .strip_prefix('{')
            .and_then(|body| body.strip_suffix('}'))
            .ok_or_else(|| self.error("malformed one-line vars block"))?;
        for pair in inner.split(',') {
            if pair.trim().is_empty() {
                continue;
            }
            let variable = self.variable(pair)?;
            self.document.variables.push(variable);
        }
        Ok(())
    }

    fn variable(&self, text: &str) -> Result<Variable> {
        let (name, value) = text
            .split_once(':')
            .ok_or_else(|| self.error("expected 'name: value'"))?;
        let name = name.trim();
        let value = value.trim().trim_end_matches(',').trim();
        if name.is_empty() {
            return Err(self.error("missing variable name"));
        }
        let value = value
            .parse()
            .map_err(|_| self.error(format!("invalid value for variable `{name}`")))?;
        Ok(Variable::new(name, value))
    }

    fn event_header(&mut self) -> Result<()> {
        let line = self.line.trim_start();
        if let Some(rest) = line.strip_prefix("eventID:") {
            if self.pending.is_some() {
                return Err(self.error("duplicate eventID"));
            }
            let name = rest.trim();
            let id = event_id_from_name(name)
                .ok_or_else(|| self.error("event name has no numeric id suffix"))?;
            self.pending = Some((name.to_string(), id));
        } else if line.starts_with("actions:[") {
            if self.pending.is_none() {
                return Err(self.error("actions list before eventID"));
            }
            self.stack.push(Frame::root());
            self.state = State::Actions;
        } else if line.starts_with('}') {
            return Err(self.error("event closed before its actions list"));
        } else {
            return Err(self.error("unexpected line in event block"));
        }
        Ok(())
    }

    fn action_line(&mut self) -> Result<()> {
        let line: &'a str = self.line;
        let trimmed = line.trim();
        if trimmed.starts_with(']') {
            return self.close_actions();
        }
        let (body, comment) = match trimmed.split_once('#') {
            Some((body, comment)) => (body.trim(), Some(comment.trim())),
            None => (trimmed, None),
        };

        if body == "end if" {
            return self.close_link();
        }

        let action = if let Some(inner) = call_body(body, "if") {
            let condition = self.condition(inner)?;
            let track = self.track(comment)?;
            self.stack.push(Frame::open(Opener::If(condition, track)));
            return Ok(());
        } else if let Some(inner) = call_body(body, "else if") {
            let condition = self.condition(inner)?;
            let track = self.track(comment)?;
            self.continue_chain()?;
            self.stack.push(Frame::open(Opener::ElseIf(condition, track)));
            return Ok(());
        } else if body == "else" {
            let track = self.track(comment)?;
            self.continue_chain()?;
            self.stack.push(Frame::open(Opener::Else(track)));
            return Ok(());
        } else if body.starts_with("branchto(") {
            let args = self.arguments(body, "branchto", &["node", "ofsection", "immediate"])?;
            let immediate = match args[2] {
                "true" => true,
                "false" => false,
                _ => return Err(self.error("`immediate` must be true or false")),
            };
            Action::BranchTo(BranchTo {
                node: self.int("node", args[0])?,
                of_section: self.int("ofsection", args[1])?,
                immediate,
                track: self.track(comment)?,
            })
        } else if body.starts_with("wait(") {
            let args = self.arguments(body, "wait", &["lowest", "millisecs"])?;
            let duration = match args[1].parse::<i64>() {
                Ok(ms) => WaitDuration::Millis(ms),
                Err(_) if is_symbol(args[1]) => WaitDuration::Symbol(args[1].to_string()),
                Err(_) => return Err(self.error("`millisecs` must be a number or a constant")),
            };
            Action::WaitTime(WaitTime {
                lowest: self.int("lowest", args[0])?,
                duration,
                track: self.track(comment)?,
            })
        } else if body.starts_with("fade(") {
            let args = self.arguments(body, "fade", &["tovol", "id", "flip", "ms"])?;
            if !is_symbol(args[1]) {
                return Err(self.error("`id` must be a fade curve constant"));
            }
            Action::Fade(Fade {
                to_volume: self.int("tovol", args[0])?,
                curve: args[1].to_string(),
                flip: self.int("flip", args[2])?,
                duration_ms: self.int("ms", args[3])?,
                track: self.track(comment)?,
            })
        } else if body.contains('=') && !body.contains('(') {
            self.assignment(body, comment)?
        } else {
            return Err(self.error("unknown action"));
        };

        self.current()?.actions.push(action);
        Ok(())
    }

    fn assignment(&self, body: &str, comment: Option<&str>) -> Result<Action> {
        let calculation = split_operator(body, &ArithmeticOp::ALL, |op| op.symbol());
        if let Some((left, operator, right)) = calculation {
            return Ok(Action::Calculate(Calculate {
                left: self.operand(left)?,
                operator,
                right: self.operand(right)?,
                track: self.track(comment)?,
            }));
        }
        let (left, right) = body
            .split_once('=')
            .ok_or_else(|| self.error("expected an assignment"))?;
        Ok(Action::SetValue(SetValue {
            left: self.operand(left.trim())?,
            right: self.operand(right.trim())?,
            track: self.track(comment)?,
        }))
    }

    fn condition(&self, inner: &str) -> Result<Condition> {
        let (left, comparison, right) = split_operator(inner, &Comparison::ALL, |op| op.symbol())
            .ok_or_else(|| self.error("expected a comparison"))?;
        Ok(Condition {
            left: self.operand(left)?,
            comparison,
            right: self.operand(right)?,
        })
    }

    fn operand(&self, text: &str) -> Result<Operand> {
        if text.is_empty() {
            return Err(self.error("missing operand"));
        }
        Ok(Operand::parse(text))
    }

    fn int(&self, name: &str, text: &str) -> Result<i64> {
        text.parse()
            .map_err(|_| self.error(format!("`{name}` must be an integer")))
    }

    fn track(&self, comment: Option<&str>) -> Result<usize> {
        comment
            .and_then(|text| text.parse::<usize>().ok())
            .filter(|&track| track < self.track_count)
            .ok_or_else(|| self.error("invalid track index"))
    }

    /// Splits `name(a=1, b=2)` and checks each parameter name in order.
    fn arguments<'b>(&self, body: &'b str, name: &str, params: &[&str]) -> Result<Vec<&'b str>> {
        let inner = call_body(body, name)
            .ok_or_else(|| self.error(format!("malformed {name}(...) call")))?;
        let parts: Vec<&str> = inner.split(',').collect();
        if parts.len() != params.len() {
            return Err(self.error(format!(
                "{name} expects {} arguments, found {}",
                params.len(),
                parts.len()
            )));
        }
        parts
            .into_iter()
            .zip(params)
            .enumerate()
            .map(|(position, (part, param))| match part.split_once('=') {
                Some((key, value)) if key.trim() == *param => Ok(value.trim()),
                _ => Err(self.error(format!(
                    "expected `{param}` as argument {} of {name}",
                    position + 1
                ))),
            })
            .collect()
    }

    fn current(&mut self) -> Result<&mut Frame> {
        let line_no = self.line_no;
        let line = self.line;
        self.stack
            .last_mut()
            .ok_or_else(|| PathMusicError::parse(line_no, line, "action outside of an action list"))
    }

    /// Closes the innermost conditional body and appends it to its parent.
    fn close_link(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(frame) if frame.opener.is_some() => {
                let action = frame
                    .close()
                    .ok_or_else(|| self.error("no open if to close"))?;
                self.current()?.actions.push(action);
                Ok(())
            }
            Some(root) => {
                self.stack.push(root);
                Err(self.error("no open if to close"))
            }
            None => Err(self.error("no open if to close")),
        }
    }

    /// `else if` / `else` close the body of the previous link, which must be
    /// an `if` or `else if`.
    fn continue_chain(&mut self) -> Result<()> {
        let open_else = matches!(
            self.stack.last(),
            Some(Frame {
                opener: Some(Opener::Else(_)),
                ..
            })
        );
        if open_else {
            return Err(self.error("else branch must be the last link of its chain"));
        }
        self.close_link()
            .map_err(|_| self.error("else without a matching if"))
    }

    fn close_actions(&mut self) -> Result<()> {
        if self.stack.len() != 1 {
            return Err(self.error("unterminated if before end of action list"));
        }
        let (name, id) = self
            .pending
            .take()
            .ok_or_else(|| self.error("action list without an event"))?;
        let actions = self.stack.pop().map(|frame| frame.actions).unwrap_or_default();
        self.document.events.push(Event { name, id, actions });
        self.state = State::EndActions;
        Ok(())
    }
}

/// Returns the text between `name(` and the final `)`.
fn call_body<'b>(body: &'b str, name: &str) -> Option<&'b str> {
    body.strip_prefix(name)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

/// Finds the first of `operators` (in priority order) present in `text` and
/// splits around it.
fn split_operator<'b, T: Copy>(
    text: &'b str,
    operators: &[T],
    symbol: impl Fn(T) -> &'static str,
) -> Option<(&'b str, T, &'b str)> {
    operators.iter().find_map(|&op| {
        let (left, right) = text.split_once(symbol(op))?;
        Some((left.trim(), op, right.trim()))
    })
}

fn is_symbol(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn dump_events(variables: &[Variable], events: &[Event]) -> String {
    let mut lines = vec!["vars: {".to_string()];
    for variable in variables {
        lines.push(format!("\t{}: {},", variable.name, variable.value));
    }
    lines.push("},".to_string());
    for event in events {
        lines.push("event: {".to_string());
        lines.push(format!("\teventID: {}", event.name));
        lines.push("\tactions:[".to_string());
        dump_actions(&event.actions, &mut lines);
        lines.push("\t],".to_string());
        lines.push("},".to_string());
    }
    tracing::debug!(
        variables = variables.len(),
        events = events.len(),
        lines = lines.len(),
        "dumped events"
    );
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn dump_actions(actions: &[Action], lines: &mut Vec<String>) {
    for (i, action) in actions.iter().enumerate() {
        lines.push(format!("\t\t{} #{}", action_text(action), action.track()));
        let Some(children) = action.children() else {
            continue;
        };
        dump_actions(children, lines);
        let chain_continues = !matches!(action, Action::Else(_))
            && actions.get(i + 1).is_some_and(Action::continues_chain);
        if !chain_continues {
            lines.push("\t\tend if".to_string());
        }
    }
}

fn action_text(action: &Action) -> String {
    match action {
        Action::If(c) => format!("if({})", c.condition),
        Action::ElseIf(c) => format!("else if({})", c.condition),
        Action::Else(_) => "else".to_string(),
        Action::BranchTo(b) => format!(
            "branchto(node={}, ofsection={}, immediate={})",
            b.node, b.of_section, b.immediate
        ),
        Action::WaitTime(w) => format!("wait(lowest={}, millisecs={})", w.lowest, w.duration),
        Action::Fade(f) => format!(
            "fade(tovol={}, id={}, flip={}, ms={})",
            f.to_volume, f.curve, f.flip, f.duration_ms
        ),
        Action::SetValue(s) => format!("{}={}", s.left, s.right),
        Action::Calculate(c) => format!("{}{}{}", c.left, c.operator, c.right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionKind, ModelData};

    fn tracks(count: usize) -> Vec<Track> {
        vec![Track::default(); count]
    }

    const EVENTS: &str = "vars: {
\tplayer: 0,
\tvariation: 0,
\tshelltrack: 0,
},
event: {
\teventID: PATH_EVENT_SetPlayerAllied_0xd9047
\tactions:[
\t\tvars['player']=1 #0
\t\tvars['variation']=PATH_RANDOMSHORT #0
\t\tvars['variation']%=2 #0
\t],
},
event: {
\teventID: PATH_EVENT_SetAdvantageEnemy_0xff1a03
\tactions:[
\t\tif(vars['player']==0) #0
\t\tbranchto(node=112, ofsection=-1, immediate=false) #0
\t\telse if(vars['player']==1) #0
\t\tbranchto(node=454, ofsection=-1, immediate=true) #1
\t\telse #0
\t\twait(lowest=0, millisecs=PATH_TIMETONEXTNODE) #0
\t\tfade(tovol=0, id=PATH_FADE_LINEAR, flip=0, ms=2500) #1
\t\tend if
\t],
},
";

    const NESTED: &str = "vars: {
},
event: {
\teventID: PATH_EVENT_Nested_0x10
\tactions:[
\t\tif(vars['mood']!=0) #0
\t\tif(vars['x']==2) #0
\t\tbranchto(node=1, ofsection=-1, immediate=false) #0
\t\telse if(vars['x']==3) #0
\t\tbranchto(node=2, ofsection=-1, immediate=false) #0
\t\telse if(vars['x']>=5) #0
\t\tbranchto(node=3, ofsection=-1, immediate=false) #0
\t\tend if
\t\tvars['x']+=1 #0
\t\tend if
\t\tif(vars['x']<4) #0
\t\tend if
\t\tif(vars['x']>4) #0
\t\tend if
\t],
},
";

    #[test]
    fn round_trips_flat_and_chained_events() {
        let document = parse_events(EVENTS, &tracks(2)).unwrap();
        assert_eq!(document.variables.len(), 3);
        assert_eq!(document.variables[0], Variable::new("player", 0));
        assert_eq!(document.events.len(), 2);
        assert_eq!(document.events[0].id, 0xd9047);
        let kinds: Vec<_> = document.events[1].actions.iter().map(Action::kind).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::If, ActionKind::ElseIf, ActionKind::Else]
        );
        assert_eq!(dump_events(&document.variables, &document.events), EVENTS);
    }

    #[test]
    fn nested_else_if_chain_keeps_its_end_if() {
        let document = parse_events(NESTED, &tracks(1)).unwrap();
        let outer = &document.events[0].actions;
        assert_eq!(outer.len(), 3);
        let inner = outer[0].children().unwrap();
        let kinds: Vec<_> = inner.iter().map(Action::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::If,
                ActionKind::ElseIf,
                ActionKind::ElseIf,
                ActionKind::Calculate
            ]
        );
        assert_eq!(dump_events(&document.variables, &document.events), NESTED);
    }

    #[test]
    fn parses_operators_and_operands() {
        let document = parse_events(EVENTS, &tracks(2)).unwrap();
        let actions = &document.events[0].actions;
        let Action::SetValue(set) = &actions[1] else {
            panic!("expected assignment");
        };
        assert_eq!(set.left, Operand::variable("variation"));
        assert_eq!(set.right, Operand::Constant("PATH_RANDOMSHORT".to_string()));
        let Action::Calculate(calc) = &actions[2] else {
            panic!("expected calculation");
        };
        assert_eq!(calc.operator, ArithmeticOp::Rem);
        assert_eq!(calc.right, Operand::Number(2));

        let Action::Else(otherwise) = &document.events[1].actions[2] else {
            panic!("expected else");
        };
        assert_eq!(otherwise.actions[1].track(), 1);
    }

    #[test]
    fn negative_assignment_is_not_a_calculation() {
        let source = "vars: {\n\tx: 0,\n},\nevent: {\n\teventID: E_0x1\n\tactions:[\n\t\tvars['x']=-1 #0\n\t],\n},\n";
        let document = parse_events(source, &tracks(1)).unwrap();
        assert_eq!(
            document.events[0].actions[0],
            Action::SetValue(SetValue {
                left: Operand::variable("x"),
                right: Operand::Number(-1),
                track: 0,
            })
        );
        assert_eq!(dump_events(&document.variables, &document.events), source);
    }

    #[test]
    fn vars_only_document_round_trips() {
        let dumped = dump_events(&[Variable::new("a", 3)], &[]);
        assert_eq!(dumped, "vars: {\n\ta: 3,\n},\n");
        let document = parse_events(&dumped, &[]).unwrap();
        assert!(document.events.is_empty());
        assert_eq!(document.variables, vec![Variable::new("a", 3)]);
    }

    #[test]
    fn dumps_editor_templates() {
        let data = ModelData {
            variables: vec![Variable::new("player", 0)],
            ..Default::default()
        };
        let cases = [
            (ActionKind::BranchTo, "branchto(node=-1, ofsection=-1, immediate=false) #0"),
            (ActionKind::Calculate, "vars['player']+=0 #0"),
            (ActionKind::If, "if(vars['player']==0) #0"),
            (ActionKind::ElseIf, "else if(vars['player']==0) #0"),
            (ActionKind::Else, "else #0"),
            (ActionKind::Fade, "fade(tovol=0, id=PATH_FADE_LINEAR, flip=0, ms=0) #0"),
            (ActionKind::SetValue, "vars['player']=0 #0"),
            (ActionKind::WaitTime, "wait(lowest=0, millisecs=0) #0"),
        ];
        for (kind, expected) in cases {
            let event = Event::new("_0x0", vec![Action::template(kind, &data)]).unwrap();
            let text = dump_events(&[], &[event]);
            let line = text
                .split('\n')
                .find(|line| line.starts_with("\t\t"))
                .unwrap()
                .trim();
            assert_eq!(line, expected);
        }
    }

    fn error_at(source: &str, track_count: usize) -> (usize, String) {
        match parse_events(source, &tracks(track_count)).unwrap_err() {
            PathMusicError::Parse { line, text, .. } => (line, text),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn reports_invalid_track_index_with_line() {
        let source = "vars: {\n},\nevent: {\n\teventID: E_0x1\n\tactions:[\n\t\tvars['x']=1 #3\n\t],\n},\n";
        assert_eq!(error_at(source, 2), (6, "\t\tvars['x']=1 #3".to_string()));
    }

    #[test]
    fn rejects_misspelled_or_reordered_arguments() {
        let reordered = "event: {\n\teventID: E_0x1\n\tactions:[\n\t\tbranchto(ofsection=-1, node=1, immediate=false) #0\n\t],\n},\n";
        assert_eq!(error_at(reordered, 1).0, 4);
        let misspelled = "event: {\n\teventID: E_0x1\n\tactions:[\n\t\twait(lowest=0, milisecs=5) #0\n\t],\n},\n";
        assert_eq!(error_at(misspelled, 1).0, 4);
    }

    #[test]
    fn rejects_unbalanced_conditionals() {
        let unclosed = "event: {\n\teventID: E_0x1\n\tactions:[\n\t\tif(vars['x']==1) #0\n\t],\n},\n";
        assert_eq!(error_at(unclosed, 1).0, 5);
        let stray = "event: {\n\teventID: E_0x1\n\tactions:[\n\t\tend if\n\t],\n},\n";
        assert_eq!(error_at(stray, 1).0, 4);
        let dangling_else = "event: {\n\teventID: E_0x1\n\tactions:[\n\t\telse #0\n\t],\n},\n";
        assert_eq!(error_at(dangling_else, 1).0, 4);
        let else_after_else = "event: {\n\teventID: E_0x1\n\tactions:[\n\t\tif(vars['x']==1) #0\n\t\telse #0\n\t\telse #0\n\t\tend if\n\t],\n},\n";
        assert_eq!(error_at(else_after_else, 1).0, 6);
    }

    #[test]
    fn rejects_structural_errors() {
        assert_eq!(error_at("garbage\n", 1).0, 1);
        let unterminated = "event: {\n\teventID: E_0x1\n\tactions:[\n\t\tvars['x']=1 #0\n";
        assert!(matches!(
            parse_events(unterminated, &tracks(1)),
            Err(PathMusicError::Parse { .. })
        ));
        let unknown = "event: {\n\teventID: E_0x1\n\tactions:[\n\t\tplay(song=1) #0\n\t],\n},\n";
        assert_eq!(error_at(unknown, 1).0, 4);
        let missing_brace = "event: {\n\teventID: E_0x1\n\tactions:[\n\t],\nevent: {\n";
        assert_eq!(error_at(missing_brace, 1).0, 5);
        let bad_var = "vars: {\n\tplayer zero\n},\n";
        assert_eq!(error_at(bad_var, 1).0, 2);

        let open_vars = "vars: {\n\tx: 0,\n";
        match parse_events(open_vars, &[]).unwrap_err() {
            PathMusicError::Parse { line, message, .. } => {
                assert_eq!(line, 3);
                assert_eq!(message, "unterminated vars block");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn reads_one_line_vars_blocks() {
        let document = parse_events("vars: { player: 0, mood: -2 },\n", &[]).unwrap();
        assert_eq!(
            document.variables,
            vec![Variable::new("player", 0), Variable::new("mood", -2)]
        );
        assert!(parse_events("vars: {},\n", &[]).unwrap().variables.is_empty());

        let dumped = dump_events(&document.variables, &document.events);
        assert_eq!(dumped, "vars: {\n\tplayer: 0,\n\tmood: -2,\n},\n");
        assert_eq!(parse_events(&dumped, &[]).unwrap(), document);
    }

    #[test]
    fn rejects_malformed_one_line_vars_blocks() {
        assert_eq!(error_at("vars: { player 0 },\n", 0).0, 1);
        assert_eq!(error_at("vars: player: 0 },\n", 0).0, 1);
        assert_eq!(error_at("vars: { player: zero },\n", 0).0, 1);
        assert_eq!(error_at("vars: [\n},\n", 0).0, 1);
    }
}
