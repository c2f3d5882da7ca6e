use sapper_core as game;
use yew::prelude::*;

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum ViewCellState {
    Hidden,
    Revealed(u8),
    Flagged,
    TriggeredMine,
    Mine,
    Misflagged,
}

impl ViewCellState {
    /// What a cell looks like in the given phase. Mines only show once the game is over.
    pub(crate) fn of(cell: &game::Cell, phase: game::GamePhase, triggered: bool) -> Self {
        use game::GamePhase::*;

        if cell.is_revealed && !cell.is_mine {
            return Self::Revealed(cell.adjacent_mines);
        }

        match phase {
            GameOver if triggered => Self::TriggeredMine,
            GameOver if cell.is_mine && !cell.is_flagged => Self::Mine,
            GameOver if cell.is_flagged && !cell.is_mine => Self::Misflagged,
            GameWon if cell.is_mine => Self::Flagged,
            _ if cell.is_flagged => Self::Flagged,
            _ => Self::Hidden,
        }
    }

    /// Text read out by screen readers for a cell in this state.
    pub(crate) fn aria_label(self, (row, column): game::Coord2) -> String {
        use ViewCellState::*;

        let state = match self {
            Hidden => "hidden".to_string(),
            Revealed(0) => "empty".to_string(),
            Revealed(1) => "1 adjacent mine".to_string(),
            Revealed(count) => format!("{} adjacent mines", count),
            Flagged => "flagged".to_string(),
            TriggeredMine => "exploded mine".to_string(),
            Mine => "mine".to_string(),
            Misflagged => "wrongly flagged".to_string(),
        };
        format!("Row {}, column {}: {}", row + 1, column + 1, state)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Self::Up),
            "ArrowDown" => Some(Self::Down),
            "ArrowLeft" => Some(Self::Left),
            "ArrowRight" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Moves the keyboard cursor one cell, wrapping around at the field edges. `size` is `(width, height)`.
pub(crate) fn step_focus(
    (row, column): game::Coord2,
    direction: Direction,
    (width, height): (game::Coord, game::Coord),
) -> game::Coord2 {
    let last_row = height.saturating_sub(1);
    let last_column = width.saturating_sub(1);
    let wrap_back = |value: game::Coord, last: game::Coord| if value == 0 { last } else { value - 1 };
    let wrap_forward = |value: game::Coord, last: game::Coord| if value >= last { 0 } else { value + 1 };

    match direction {
        Direction::Up => (wrap_back(row, last_row), column),
        Direction::Down => (wrap_forward(row, last_row), column),
        Direction::Left => (row, wrap_back(column, last_column)),
        Direction::Right => (row, wrap_forward(column, last_column)),
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum CellMsg {
    Trigger(game::Coord2),
    Flag(game::Coord2),
    /// Enter on a focused cell. Unlike a click it is never suppressed after a pan.
    Activate(game::Coord2),
    Focus(game::Coord2),
    Move(game::Coord2, Direction),
}

#[derive(Properties, Clone, PartialEq)]
pub(crate) struct CellProps {
    pub coords: game::Coord2,
    pub state: ViewCellState,
    /// Only the cursor cell is in the tab order.
    #[prop_or_default]
    pub focused: bool,
    pub callback: Callback<CellMsg>,
}

#[function_component(CellView)]
pub(crate) fn cell_component(props: &CellProps) -> Html {
    use ViewCellState::*;

    let CellProps {
        coords,
        state,
        focused,
        callback,
    } = props.clone();

    let class = classes!(
        "sapper-cell",
        match state {
            Hidden => classes!(),
            Revealed(count) => classes!("open", format!("num-{}", count)),
            Flagged => classes!("flag"),
            TriggeredMine => classes!("open", "mine", "oops"),
            Mine => classes!("open", "mine"),
            Misflagged => classes!("flag", "wrong"),
        }
    );

    let onclick = {
        let callback = callback.clone();
        Callback::from(move |_: MouseEvent| {
            log::trace!("{:?} click", coords);
            callback.emit(CellMsg::Trigger(coords));
        })
    };

    let oncontextmenu = {
        let callback = callback.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            log::trace!("{:?} context menu", coords);
            callback.emit(CellMsg::Flag(coords));
        })
    };

    let onfocus = {
        let callback = callback.clone();
        Callback::from(move |_: FocusEvent| callback.emit(CellMsg::Focus(coords)))
    };

    let onkeydown = Callback::from(move |e: KeyboardEvent| {
        let key = e.key();
        let msg = match key.as_str() {
            "Enter" => CellMsg::Activate(coords),
            " " | "Space" | "Spacebar" => CellMsg::Flag(coords),
            other => match Direction::from_key(other) {
                Some(direction) => CellMsg::Move(coords, direction),
                None => return,
            },
        };
        e.prevent_default();
        e.stop_propagation();
        log::trace!("{:?} key {:?}", coords, key);
        callback.emit(msg);
    });

    let content = match state {
        Revealed(count) if count > 0 => count.to_string(),
        _ => String::new(),
    };

    let (row, column) = coords;
    html! {
        <td
            {class}
            id={format!("cell-{}-{}", row, column)}
            role="gridcell"
            tabindex={if focused { "0" } else { "-1" }}
            aria-label={state.aria_label(coords)}
            {onclick}
            {oncontextmenu}
            {onfocus}
            {onkeydown}
        >
            {content}
        </td>
    }
}
