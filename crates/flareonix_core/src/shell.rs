//! crates/flareonix_core/src/shell.rs
//!
//! The navigation state of the dashboard. All changes go through
//! `ShellState::apply` so every mutation is an explicit event.

use serde::{Deserialize, Serialize};

use crate::domain::{IdeaEvaluation, UserProfile};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationTab {
    #[default]
    Dashboard,
    Evaluate,
    History,
    Guide,
    Settings,
}

/// What the main area actually renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Landing,
    Dashboard,
    Evaluate,
    History,
    Guide,
    Settings,
}

impl From<NavigationTab> for View {
    fn from(tab: NavigationTab) -> Self {
        match tab {
            NavigationTab::Dashboard => View::Dashboard,
            NavigationTab::Evaluate => View::Evaluate,
            NavigationTab::History => View::History,
            NavigationTab::Guide => View::Guide,
            NavigationTab::Settings => View::Settings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    Navigate(NavigationTab),
    OpenLoginPrompt,
    CloseLoginPrompt,
    SignedIn(UserProfile),
    SignedOut,
    ProfileUpdated(UserProfile),
    SetChatOpen(bool),
    EvaluationRecorded(IdeaEvaluation),
    HistoryCleared,
}

/// Side effects the caller must carry out after an event was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEffect {
    /// The user left the evaluator while an evaluation may still be streaming.
    LeftEvaluator,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellState {
    pub profile: Option<UserProfile>,
    pub active_tab: NavigationTab,
    pub login_prompt_open: bool,
    pub chat_open: bool,
    /// Newest first.
    pub evaluations: Vec<IdeaEvaluation>,
}

/// A serializable snapshot for the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellView {
    pub view: View,
    pub active_tab: NavigationTab,
    pub signed_in: bool,
    pub profile_name: Option<String>,
    pub login_prompt_open: bool,
    pub chat_open: bool,
    pub evaluation_count: usize,
}

impl ShellState {
    pub fn new(profile: Option<UserProfile>, evaluations: Vec<IdeaEvaluation>) -> Self {
        Self {
            profile,
            evaluations,
            ..Default::default()
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.profile.is_some()
    }

    /// Signed-out visitors only ever see the landing page, except for the guide.
    pub fn visible_view(&self) -> View {
        if self.profile.is_none()
            && !self.login_prompt_open
            && self.active_tab != NavigationTab::Guide
        {
            return View::Landing;
        }
        self.active_tab.into()
    }

    pub fn view(&self) -> ShellView {
        ShellView {
            view: self.visible_view(),
            active_tab: self.active_tab,
            signed_in: self.is_signed_in(),
            profile_name: self.profile.as_ref().map(|p| p.name.clone()),
            login_prompt_open: self.login_prompt_open,
            chat_open: self.chat_open,
            evaluation_count: self.evaluations.len(),
        }
    }

    pub fn apply(&mut self, event: ShellEvent) -> Option<ShellEffect> {
        match event {
            ShellEvent::Navigate(tab) => {
                let left_evaluator =
                    self.active_tab == NavigationTab::Evaluate && tab != NavigationTab::Evaluate;
                self.active_tab = tab;
                if left_evaluator {
                    return Some(ShellEffect::LeftEvaluator);
                }
            }
            ShellEvent::OpenLoginPrompt => self.login_prompt_open = true,
            ShellEvent::CloseLoginPrompt => self.login_prompt_open = false,
            ShellEvent::SignedIn(profile) => {
                self.profile = Some(profile);
                self.login_prompt_open = false;
            }
            ShellEvent::SignedOut => self.profile = None,
            ShellEvent::ProfileUpdated(profile) => self.profile = Some(profile),
            ShellEvent::SetChatOpen(open) => self.chat_open = open,
            ShellEvent::EvaluationRecorded(evaluation) => self.evaluations.insert(0, evaluation),
            ShellEvent::HistoryCleared => self.evaluations.clear(),
        }
        None
    }
}
