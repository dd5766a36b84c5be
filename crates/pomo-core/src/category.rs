//! Selection of the next interval category.

use crate::error::Error;
use crate::repository::Repository;
use crate::types::Category;

/// Number of recent breaks inspected when choosing between a short and a long break.
const BREAK_WINDOW: usize = 3;

/// Decides the category of the next interval from the repository history.
///
/// Every break is followed by a pomodoro. After a pomodoro comes a short break,
/// unless none of the last three breaks was long, in which case it is a long
/// break. This makes every fourth pomodoro end in a long break without keeping
/// a counter.
pub fn next_category(repo: &dyn Repository) -> Result<Category, Error> {
    let last = match repo.last() {
        Ok(last) => last,
        Err(Error::NoIntervals) => return Ok(Category::Pomodoro),
        Err(err) => return Err(err),
    };

    if last.category.is_break() {
        return Ok(Category::Pomodoro);
    }

    let breaks = repo.breaks(BREAK_WINDOW)?;
    if breaks.len() < BREAK_WINDOW {
        return Ok(Category::ShortBreak);
    }

    if breaks
        .iter()
        .any(|interval| interval.category == Category::LongBreak)
    {
        return Ok(Category::ShortBreak);
    }

    Ok(Category::LongBreak)
}
