use chrono::{DateTime, Utc};
use ratatui::widgets::{ListState, TableState};
use std::time::Instant;
use tracing::debug;

use crate::board::{BoardContext, BoardState, ContestList, NO_CONTEST};
use crate::config::{BoardConfig, Config};
use crate::standings::RankedStanding;
use crate::timing::Countdown;
use crate::tui::theme::ThemeColors;
use crate::watch::{StoreUpdate, UpdateTarget};

/// Seconds a flash message stays in the status bar
const FLASH_SECS: u64 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    ContestPicker,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Info,
    Success,
    Error,
}

pub struct App {
    pub config: Config,
    pub board_index: usize,
    pub state: BoardState,
    pub contests: ContestList,
    /// Whether the contest was chosen rather than defaulted
    pub contest_pinned: bool,
    pub table_state: TableState,
    pub picker_state: ListState,
    pub input_mode: InputMode,
    pub flash_message: Option<(String, FlashKind, Instant)>,
    /// The board context changed and its watch must be restarted
    pub needs_watch: bool,
    /// The board changed and its contest index must be followed instead
    pub needs_contest_watch: bool,
    /// Generation the current board watch is started with
    pub generation: u64,
    /// Generation the current contest watch is started with
    pub contest_generation: u64,
    pub should_quit: bool,
    pub spinner_frame: usize,
    /// Whether any live (not cached) standings have arrived for this context
    pub live: bool,
    pub theme: ThemeColors,
}

impl App {
    pub fn new(
        config: Config,
        board_index: usize,
        contest: &str,
        contest_pinned: bool,
        theme: ThemeColors,
    ) -> Self {
        let board_index = board_index.min(config.boards.len().saturating_sub(1));
        let board = config
            .boards
            .get(board_index)
            .cloned()
            .unwrap_or_else(|| crate::config::default_boards().remove(0));
        let state = BoardState::new(BoardContext::new(board, contest));

        Self {
            config,
            board_index,
            state,
            contests: ContestList::default(),
            contest_pinned,
            table_state: TableState::default(),
            picker_state: ListState::default(),
            input_mode: InputMode::Normal,
            flash_message: None,
            needs_watch: true,
            needs_contest_watch: true,
            generation: 0,
            contest_generation: 0,
            should_quit: false,
            spinner_frame: 0,
            live: false,
            theme,
        }
    }

    pub fn context(&self) -> &BoardContext {
        &self.state.context
    }

    pub fn board(&self) -> &BoardConfig {
        &self.state.context.board
    }

    pub fn standings(&self) -> &[RankedStanding] {
        &self.state.standings
    }

    /// Still waiting for the first standings document
    pub fn is_loading(&self) -> bool {
        !self.state.has_standings && self.context().contest != NO_CONTEST
    }

    pub fn countdown(&self, now: DateTime<Utc>) -> Countdown {
        Countdown::compute(self.state.last_updated, now, self.config.update_interval)
    }

    /// Apply an update from a watch. Updates for any other context than the
    /// current one are stale and dropped. Returns whether anything changed.
    pub fn apply_update(&mut self, update: StoreUpdate) -> bool {
        match update.target {
            UpdateTarget::Feed(context, feed) => {
                if context != self.state.context || update.generation != self.generation {
                    debug!(contest = %context.contest, "Dropping stale update");
                    return false;
                }
                match update.payload {
                    Ok(value) => {
                        // Cached copies never replace live data
                        if update.cached && self.live {
                            return false;
                        }
                        let changed = self.state.apply(feed, value.as_ref());
                        if changed && feed == crate::board::Feed::Standings {
                            if !update.cached {
                                self.live = true;
                            }
                            self.clamp_selection();
                        }
                        changed
                    }
                    Err(message) => {
                        self.show_error(message);
                        false
                    }
                }
            }
            UpdateTarget::Contests(board) => {
                if board != self.board().name || update.generation != self.contest_generation {
                    debug!(board = %board, "Dropping stale contest list");
                    return false;
                }
                match update.payload {
                    Ok(value) => {
                        let changed = self.contests.apply(value.as_ref());
                        if changed && !self.contest_pinned && self.context().contest == NO_CONTEST {
                            if let Some(latest) = self.contests.latest().map(str::to_string) {
                                self.switch_contest(&latest, false);
                            }
                        }
                        changed
                    }
                    Err(message) => {
                        self.show_error(message);
                        false
                    }
                }
            }
        }
    }

    /// Show another contest on the current board
    pub fn switch_contest(&mut self, contest: &str, pinned: bool) {
        self.contest_pinned |= pinned;
        if contest == self.context().contest {
            return;
        }
        let board = self.board().clone();
        self.reset_state(BoardContext::new(board, contest));
    }

    /// Cycle through the configured boards, keeping the contest
    pub fn cycle_board(&mut self, forward: bool) {
        let count = self.config.boards.len();
        if count < 2 {
            return;
        }
        self.board_index = if forward {
            (self.board_index + 1) % count
        } else {
            (self.board_index + count - 1) % count
        };
        let board = self.config.boards[self.board_index].clone();
        let contest = self.context().contest.clone();
        self.reset_state(BoardContext::new(board, &contest));
        self.contests = ContestList::default();
        self.restart_contest_watch();
    }

    /// Drop everything shown and follow the current context again
    pub fn reconnect(&mut self) {
        let context = self.context().clone();
        self.reset_state(context);
        self.restart_contest_watch();
        self.show_flash("Reconnecting...".to_string(), FlashKind::Info);
    }

    fn reset_state(&mut self, context: BoardContext) {
        self.state = BoardState::new(context);
        self.live = false;
        self.table_state.select(None);
        self.generation += 1;
        self.needs_watch = true;
    }

    fn restart_contest_watch(&mut self) {
        self.contest_generation += 1;
        self.needs_contest_watch = true;
    }

    fn clamp_selection(&mut self) {
        let len = self.state.standings.len();
        match self.table_state.selected() {
            _ if len == 0 => self.table_state.select(None),
            Some(selected) if selected >= len => self.table_state.select(Some(len - 1)),
            _ => {}
        }
    }

    pub fn next_row(&mut self) {
        let len = self.state.standings.len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let len = self.state.standings.len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    pub fn selected_standing(&self) -> Option<&RankedStanding> {
        self.table_state
            .selected()
            .and_then(|i| self.state.standings.get(i))
    }

    /// Open the AtCoder profile of the selected team
    pub fn open_selected(&mut self) {
        let Some(standing) = self.selected_standing() else {
            return;
        };
        if standing.atcoder.is_empty() {
            let msg = format!("{} has no AtCoder handle", standing.name);
            self.show_error(msg);
            return;
        }
        let url = standing.profile_url();
        match crate::browser::open_url(&url) {
            Ok(()) => self.show_flash(format!("Opened {}", url), FlashKind::Success),
            Err(e) => self.show_error(format!("{:#}", e)),
        }
    }

    /// Open the contest picker on the current contest
    pub fn open_picker(&mut self) {
        if self.contests.is_empty() {
            self.show_flash("No contests known yet".to_string(), FlashKind::Info);
            return;
        }
        let position = self.contests.position(&self.context().contest).unwrap_or(0);
        self.picker_state.select(Some(position));
        self.input_mode = InputMode::ContestPicker;
    }

    pub fn picker_next(&mut self) {
        let len = self.contests.len();
        if len == 0 {
            return;
        }
        let i = match self.picker_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.picker_state.select(Some(i));
    }

    pub fn picker_previous(&mut self) {
        let len = self.contests.len();
        if len == 0 {
            return;
        }
        let i = match self.picker_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.picker_state.select(Some(i));
    }

    /// Switch to the contest highlighted in the picker
    pub fn confirm_picker(&mut self) {
        self.input_mode = InputMode::Normal;
        let chosen = self
            .picker_state
            .selected()
            .and_then(|i| self.contests.contests.get(i))
            .map(|(id, _)| id.clone());
        if let Some(contest) = chosen {
            self.switch_contest(&contest, true);
        }
    }

    pub fn cancel_picker(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Show help overlay
    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    /// Dismiss help overlay
    pub fn dismiss_help(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn update_flash(&mut self) {
        if let Some((_, _, timestamp)) = self.flash_message {
            if timestamp.elapsed().as_secs() >= FLASH_SECS {
                self.flash_message = None;
            }
        }
    }

    pub fn show_flash(&mut self, msg: String, kind: FlashKind) {
        self.flash_message = Some((msg, kind, Instant::now()));
    }

    pub fn show_error(&mut self, msg: String) {
        self.show_flash(msg, FlashKind::Error);
    }

    /// Advance the loading spinner animation frame
    pub fn advance_spinner(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }
}
