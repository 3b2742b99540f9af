//! Store example with combined slices and typed actions

use std::sync::Arc;

use unistore::{combine_reducers, create_dispatcher, distinct_selector, Action, SliceReducers};

#[derive(Clone, Debug)]
struct TodoItem {
    id: usize,
    text: String,
    completed: bool,
}

#[derive(Clone, Debug)]
enum TodoAction {
    Add(String),
    Complete(usize),
    Filter(&'static str),
}

impl Action for TodoAction {
    fn action_type(&self) -> Option<&str> {
        Some(match self {
            TodoAction::Add(_) => "todos/add",
            TodoAction::Complete(_) => "todos/complete",
            TodoAction::Filter(_) => "filter/set",
        })
    }
}

fn todos(state: Option<&Arc<Vec<TodoItem>>>, action: &TodoAction) -> Option<Arc<Vec<TodoItem>>> {
    let Some(todos) = state else {
        return Some(Arc::new(Vec::new()));
    };
    match action {
        TodoAction::Add(text) => {
            let mut next = todos.as_ref().clone();
            next.push(TodoItem {
                id: next.len() + 1,
                text: text.clone(),
                completed: false,
            });
            Some(Arc::new(next))
        }
        TodoAction::Complete(id) => Some(Arc::new(
            todos
                .iter()
                .map(|todo| TodoItem {
                    completed: todo.completed || todo.id == *id,
                    ..todo.clone()
                })
                .collect(),
        )),
        _ => Some(Arc::clone(todos)),
    }
}

fn filter(state: Option<&Arc<String>>, action: &TodoAction) -> Option<Arc<String>> {
    match (state, action) {
        (_, TodoAction::Filter(to)) => Some(Arc::new(to.to_string())),
        (None, _) => Some(Arc::new("all".to_string())),
        (Some(current), _) => Some(Arc::clone(current)),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Store Example ===\n");

    let root = combine_reducers(SliceReducers::new().with("todos", todos).with("filter", filter));
    let initial = root
        .initial_state(&TodoAction::Filter("all"))
        .expect("every slice has a default");
    let store = create_dispatcher(root, initial);

    let active = distinct_selector(|todos: &Option<Arc<Vec<TodoItem>>>| {
        todos
            .as_deref()
            .map(|todos| todos.iter().filter(|t| !t.completed).count())
            .unwrap_or(0)
    });

    let watcher = store.subscribe(move |state| {
        println!(
            "State updated! Active todos: {}",
            active.select(state.get::<Vec<TodoItem>>("todos"))
        );
    });

    println!("Adding todo...");
    store
        .dispatch(TodoAction::Add("Learn reducers".to_string()))
        .expect("valid action");

    println!("\nCompleting todo...");
    store.dispatch(TodoAction::Complete(1)).expect("valid action");

    println!("\nSwitching filter...");
    store.dispatch(TodoAction::Filter("done")).expect("valid action");

    drop(watcher);
    println!("\nFinal todos: {:#?}", store.get_state().get::<Vec<TodoItem>>("todos"));
    println!("Filter: {:?}", store.get_state().get::<String>("filter"));
}
