use std::fmt;

/// Workflow states. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Start,
    Login,
    ChooseCourse,
    ChooseAction,
    ExecuteAction,
    Quit,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Start => "start",
            State::Login => "login",
            State::ChooseCourse => "choose_course",
            State::ChooseAction => "choose_action",
            State::ExecuteAction => "execute_action",
            State::Quit => "quit",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Quit)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a state, deciding where the workflow goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Begin,
    LoggedIn,
    CourseChosen,
    ActionChosen,
    StayOnCourse,
    BackToCourses,
    QuitRequested,
    /// A remote call or the console failed inside the state.
    Failed,
    Finished,
}

/// The fixed transition table. `None` marks an event the state cannot emit.
pub fn transition(state: State, event: Event) -> Option<State> {
    use Event as E;
    use State as S;
    let next = match (state, event) {
        (S::Quit, _) => return None,
        (_, E::Failed | E::QuitRequested) => S::Quit,
        (S::Start, E::Begin) => S::Login,
        (S::Login, E::LoggedIn) => S::ChooseCourse,
        (S::ChooseCourse, E::CourseChosen) => S::ChooseAction,
        (S::ChooseAction, E::ActionChosen) => S::ExecuteAction,
        (S::ChooseAction, E::BackToCourses) => S::ChooseCourse,
        (S::ExecuteAction, E::StayOnCourse) => S::ChooseAction,
        (S::ExecuteAction, E::BackToCourses) => S::ChooseCourse,
        _ => return None,
    };
    Some(next)
}
