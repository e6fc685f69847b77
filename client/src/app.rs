use leptos::prelude::*;
use territory_shared::{Record, StatsMap, aggregate, registry};

use crate::api::fetch_records;
use crate::labels::{hub_hash, record_count_label};
use crate::map::TerritoryMap;

/// Route the host app to a region's hub page.
pub(crate) fn navigate_to_hub(region_id: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(e) = window.location().set_hash(&hub_hash(region_id)) {
        web_sys::console::warn_1(&format!("navigation to hub failed: {e:?}").into());
    }
}

#[derive(Debug, Clone, PartialEq)]
enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

#[component]
pub fn App() -> impl IntoView {
    let records: RwSignal<Vec<Record>> = RwSignal::new(Vec::new());
    let load_state = RwSignal::new(LoadState::Loading);

    wasm_bindgen_futures::spawn_local(async move {
        match fetch_records().await {
            Ok(list) => {
                records.set(list);
                load_state.set(LoadState::Ready);
            }
            Err(e) => {
                web_sys::console::warn_1(&format!("Record fetch failed: {e}").into());
                load_state.set(LoadState::Failed(e));
            }
        }
    });

    let stats: Memo<StatsMap> =
        Memo::new(move |_| records.with(|list| aggregate(list, registry().regions())));
    let on_select = Callback::new(|region_id: String| navigate_to_hub(&region_id));

    let status = move || match load_state.get() {
        LoadState::Loading => "Loading records...".to_string(),
        LoadState::Ready => records.with(|list| record_count_label(list.len())),
        LoadState::Failed(e) => format!("Records unavailable ({e})"),
    };

    view! {
        <div style="position: fixed; inset: 0; font-family: Inter, system-ui, sans-serif;">
            <TerritoryMap stats=stats on_select=on_select />
            <div
                style="position: absolute; bottom: 24px; left: 50%; transform: translateX(-50%); z-index: 25; padding: 6px 12px; border-radius: 999px; background: rgba(255,255,255,0.85); border: 1px solid #e5e7eb; font-size: 10px; font-weight: 700; color: #6b7280; pointer-events: none;"
                style:color=move || if matches!(load_state.get(), LoadState::Failed(_)) { "#b91c1c" } else { "#6b7280" }
            >
                {status}
            </div>
        </div>
    }
}
