use tracing::debug;

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Visibility predicate of a view.
///
/// `when_true`/`when_false` are invoked once per entry whenever the filter is
/// attached and the view rescans its mirror.
pub trait ViewFilter<T, V>: Send {
    fn is_match(&self, value: &T, view: &V) -> bool;

    fn when_true(&mut self, _value: &T, _view: &V) {}

    fn when_false(&mut self, _value: &T, _view: &V) {}
}

/// Adapter turning a plain predicate into a [`ViewFilter`].
pub struct FnFilter<F>(pub F);

impl<T, V, F> ViewFilter<T, V> for FnFilter<F>
where
    F: Fn(&T, &V) -> bool + Send,
{
    fn is_match(&self, value: &T, view: &V) -> bool {
        (self.0)(value, view)
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// What a `Replace` looks like from outside, given whether the old and the
/// new entry pass the filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Replace,
    Remove,
    Add,
    Nothing,
}

impl Transition {
    pub fn of(old_match: bool, new_match: bool) -> Self {
        match (old_match, new_match) {
            (true, true) => Transition::Replace,
            (true, false) => Transition::Remove,
            (false, true) => Transition::Add,
            (false, false) => Transition::Nothing,
        }
    }
}

/// The installed filter together with the number of entries that pass it.
///
/// No filter installed means every entry matches.
pub struct FilterState<T, V> {
    filter: Option<Box<dyn ViewFilter<T, V>>>,
    visible: usize,
}

impl<T, V> FilterState<T, V> {
    pub fn new() -> Self {
        FilterState {
            filter: None,
            visible: 0,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.filter.is_some()
    }

    pub fn visible_count(&self) -> usize {
        self.visible
    }

    pub fn is_match(&self, value: &T, view: &V) -> bool {
        match self.filter.as_ref() {
            Some(filter) => filter.is_match(value, view),
            None => true,
        }
    }

    /// Number of matching entries among `entries`, which must be the mirror
    /// entries positioned before the one of interest.
    pub fn visible_before<'a>(&self, entries: impl IntoIterator<Item = (&'a T, &'a V)>, position: usize) -> usize
    where
        T: 'a,
        V: 'a,
    {
        if self.filter.is_none() {
            return position;
        }
        entries
            .into_iter()
            .take(position)
            .filter(|(value, view)| self.is_match(value, view))
            .count()
    }

    /// Installs `filter` and recounts visible entries.
    pub fn attach<'a>(
        &mut self,
        mut filter: Box<dyn ViewFilter<T, V>>,
        entries: impl IntoIterator<Item = (&'a T, &'a V)>,
    ) where
        T: 'a,
        V: 'a,
    {
        let mut visible = 0;
        for (value, view) in entries {
            if filter.is_match(value, view) {
                visible += 1;
                filter.when_true(value, view);
            } else {
                filter.when_false(value, view);
            }
        }
        debug!(visible, "filter attached");
        self.filter = Some(filter);
        self.visible = visible;
    }

    /// Removes the filter. Every entry becomes visible and is handed to
    /// `on_reset`.
    pub fn reset<'a>(
        &mut self,
        entries: impl IntoIterator<Item = (&'a T, &'a V)>,
        mut on_reset: impl FnMut(&T, &V),
    ) where
        T: 'a,
        V: 'a,
    {
        self.filter = None;
        let mut visible = 0;
        for (value, view) in entries {
            visible += 1;
            on_reset(value, view);
        }
        debug!(visible, "filter reset");
        self.visible = visible;
    }

    //<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

    /// Accounts for a new entry. Returns whether it is visible.
    pub fn added(&mut self, value: &T, view: &V) -> bool {
        let matched = self.is_match(value, view);
        if matched {
            self.visible += 1;
        }
        matched
    }

    /// Accounts for a removed entry. Returns whether it was visible.
    pub fn removed(&mut self, value: &T, view: &V) -> bool {
        let matched = self.is_match(value, view);
        if matched {
            self.visible -= 1;
        }
        matched
    }

    pub fn replaced(&mut self, old: (&T, &V), new: (&T, &V)) -> Transition {
        let transition = Transition::of(self.is_match(old.0, old.1), self.is_match(new.0, new.1));
        match transition {
            Transition::Remove => self.visible -= 1,
            Transition::Add => self.visible += 1,
            Transition::Replace | Transition::Nothing => {}
        }
        transition
    }

    pub fn cleared(&mut self) {
        self.visible = 0;
    }
}

impl<T, V> Default for FilterState<T, V> {
    fn default() -> Self {
        FilterState::new()
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
