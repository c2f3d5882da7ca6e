use sapper_core as game;
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq)]
pub(crate) struct ControlsProps {
    /// `None` when the field size matches no preset.
    pub selected: Option<game::Difficulty>,
    pub mines_left: i64,
    pub phase: game::GamePhase,
    pub on_new_game: Callback<()>,
    pub on_select: Callback<game::Difficulty>,
}

fn phase_class(phase: game::GamePhase) -> &'static str {
    use game::GamePhase::*;
    match phase {
        Idle => "not-started",
        Playing => "in-progress",
        GameWon => "win",
        GameOver => "lose",
    }
}

#[function_component(ControlsView)]
pub(crate) fn controls_component(props: &ControlsProps) -> Html {
    let ControlsProps {
        selected,
        mines_left,
        phase,
        on_new_game,
        on_select,
    } = props.clone();

    let buttons = game::Difficulty::ALL.into_iter().map(|difficulty| {
        let on_select = on_select.clone();
        let class = classes!(
            "difficulty",
            (selected == Some(difficulty)).then_some("difficulty--active")
        );
        html! {
            <button {class} type="button" onclick={move |_| on_select.emit(difficulty)}>
                { difficulty.name() }
            </button>
        }
    });

    html! {
        <>
            <div class="difficulties">{ for buttons }</div>
            <div class="counter" title="Mines left">{ format!("{:03}", mines_left) }</div>
            <button
                class={classes!("new-game", phase_class(phase))}
                type="button"
                onclick={move |_| on_new_game.emit(())}
            >
                { "New game" }
            </button>
        </>
    }
}
