//! Search, subject selection, comparables, repair and MAO subcommands.

use console::style;

use compscope_core::format::{deal_score_band, format_currency, recommendation_label};
use compscope_core::{
    AnalysisResult, MaoInputs, MaoInputsUpdate, MaoRule, RepairBreakdown, RepairInputs,
};

use super::output::{print_properties, print_property, success, Output};
use crate::commands;
use crate::models::property::Property;
use crate::models::search::SearchFilters;
use crate::state::AppState;

pub async fn cmd_search(state: &AppState, out: &mut Output, filters: SearchFilters) -> anyhow::Result<()> {
    let response = commands::search_properties(state, filters).await;
    if let Some(results) = out.finish(response)? {
        print_properties(&results.properties, Property::price);
        if results.count > 0 {
            println!(
                "\n{}",
                style("Pick a subject with `compscope select <number|id>`").dim()
            );
        }
    }
    Ok(())
}

pub async fn cmd_lookup(state: &AppState, out: &mut Output, address: &str) -> anyhow::Result<()> {
    let response = commands::lookup_address(state, address).await;
    if let Some(results) = out.finish(response)? {
        print_properties(&results.properties, Property::price);
    }
    Ok(())
}

/// Select a subject, then load its full details
pub async fn cmd_select(
    state: &AppState,
    out: &mut Output,
    selector: &str,
    uploaded_images: Vec<String>,
) -> anyhow::Result<()> {
    let response = commands::select_property(state, selector, uploaded_images).await;
    out.finish(response)?;
    cmd_details(state, out).await
}

pub async fn cmd_details(state: &AppState, out: &mut Output) -> anyhow::Result<()> {
    let response = commands::fetch_property_details(state).await;
    if let Some(property) = out.finish(response)? {
        print_subject(&property);
    }
    Ok(())
}

fn print_subject(property: &Property) {
    let address = property
        .display_address()
        .unwrap_or_else(|| "(no address)".to_string());
    println!("{} {}", style("Subject").bold(), address);
    print_property(1, property, Property::price);
    let images = property.subject_images();
    if !images.is_empty() {
        println!("     {} photo(s)", images.len());
    }
}

pub async fn cmd_comps_find(state: &AppState, out: &mut Output) -> anyhow::Result<()> {
    let response = commands::find_comparables(state).await;
    if let Some(list) = out.finish(response)? {
        print_properties(&list.data, Property::sale_price);
    }
    Ok(())
}

pub fn cmd_comps_list(state: &AppState, out: &mut Output) -> anyhow::Result<()> {
    let selection = state.comps().selection();
    if let Some(list) = out.finish(commands::list_comparables(state))? {
        if let Some(error) = &list.error {
            println!("{} {}", style("Last search failed:").red(), error);
            return Ok(());
        }
        if list.is_empty() {
            println!("No comparables yet. Run `compscope comps find`.");
            return Ok(());
        }
        for (i, comp) in list.data.iter().enumerate() {
            let id = comp.any_id().unwrap_or_default();
            let mark = if selection.contains(&id) {
                style("[x]").green()
            } else {
                style("[ ]").dim()
            };
            print!("{}", mark);
            print_property(i + 1, comp, Property::sale_price);
        }
        println!("\n{} of {} selected", selection.len(), list.count);
    }
    Ok(())
}

pub fn cmd_comps_toggle(
    state: &AppState,
    out: &mut Output,
    ids: &[String],
    selected: bool,
) -> anyhow::Result<()> {
    for id in ids {
        if let Some(selection) = out.finish(commands::toggle_comp(state, id, selected))? {
            let verb = if selected { "Selected" } else { "Deselected" };
            println!("{} {} {} ({} selected)", success(), verb, id, selection.len());
        }
    }
    Ok(())
}

pub fn cmd_repair(state: &AppState, out: &mut Output, inputs: Option<RepairInputs>) -> anyhow::Result<()> {
    let inputs = inputs.unwrap_or_else(|| state.comps().repair_inputs());
    if let Some(total) = out.finish(commands::set_repair_inputs(state, inputs.clone()))? {
        print_repairs(&inputs, total);
    }
    Ok(())
}

fn print_repairs(inputs: &RepairInputs, total: u64) {
    println!("{}", style("Repair estimate").bold());
    println!("  Rehab rate    {}/sqft", format_currency(Some(inputs.rehab_per_sqft)));
    if inputs.needs_roof {
        println!("  Roof          {}", format_currency(Some(inputs.roof_cost)));
    }
    if inputs.needs_ac {
        println!("  A/C           {}", format_currency(Some(inputs.ac_cost)));
    }
    if inputs.other_repair > 0.0 {
        println!("  Other         {}", format_currency(Some(inputs.other_repair)));
    }
    if inputs.add_buffer {
        println!("  Buffer        10%");
    }
    println!("  {}         {}", style("Total").bold(), format_currency(Some(total as f64)));
}

pub fn cmd_mao_show(state: &AppState, out: &mut Output) -> anyhow::Result<()> {
    let inputs = state.comps().mao_inputs();
    if out.is_json() {
        println!("{}", serde_json::to_string_pretty(&inputs)?);
        return Ok(());
    }
    print_mao(&inputs);
    Ok(())
}

pub fn cmd_mao_set(state: &AppState, out: &mut Output, update: MaoInputsUpdate) -> anyhow::Result<()> {
    if let Some(inputs) = out.finish(commands::update_mao_inputs(state, update))? {
        print_mao(&inputs);
    }
    Ok(())
}

fn print_mao(inputs: &MaoInputs) {
    println!("{}", style("MAO inputs").bold());
    println!("  Rule              {}", inputs.mao_rule);
    println!("  Estimated repairs {}", format_currency(Some(inputs.estimated_repairs)));
    println!("  Holding cost      {}", format_currency(Some(inputs.holding_cost)));
    println!("  Closing cost      {}", format_currency(Some(inputs.closing_cost)));
    println!("  Wholesale fee     {}", format_currency(Some(inputs.wholesale_fee)));
}

pub async fn cmd_mao_recalculate(state: &AppState, out: &mut Output) -> anyhow::Result<()> {
    if let Some(result) = out.finish(commands::recalculate_mao(state).await)? {
        print_result(&result);
    }
    Ok(())
}

pub fn parse_mao_rule(s: &str) -> Result<MaoRule, String> {
    MaoRule::parse(s).ok_or_else(|| {
        let known: Vec<&str> = MaoRule::ALL.iter().map(|r| r.as_str()).collect();
        format!("unknown MAO rule {:?}; expected one of {}", s, known.join(", "))
    })
}

/// Results summary: valuation, offer and deal score
pub fn print_result(result: &AnalysisResult) {
    println!("{}", style("Analysis results").bold());
    println!("  ARV               {}", format_currency(result.arv()));
    println!("  MAO               {}", format_currency(result.mao()));
    println!("  Estimated repairs {}", format_currency(result.estimated_repairs()));
    if let Some(user) = result.user_estimated_repairs() {
        println!("  Your estimate     {}", format_currency(Some(user)));
    }
    if let Some(ai) = result.ai_estimated_repairs() {
        println!("  AI repairs        {}", format_currency(Some(ai)));
        if let Some(breakdown) = result.ai_repair_breakdown() {
            println!("                    {}", repair_breakdown_line(&breakdown));
        }
    }
    if result.suggested_offer().is_some() {
        println!("  Suggested offer   {}", format_currency(result.suggested_offer()));
    }
    println!("  Repair extent     {}", result.repair_extent_label());
    if let Some(score) = result.deal_score().and_then(|s| s.overall) {
        println!(
            "  Deal score        {:.1} ({})",
            score,
            deal_score_band(score).label()
        );
    }
    if let Some(recommendation) = result.recommendation() {
        if let Some(code) = &recommendation.recommendation {
            println!("  Recommendation    {}", recommendation_label(code));
        }
        if let Some(reason) = &recommendation.recommendation_reason {
            println!("                    {}", style(reason).dim());
        }
    }
    if let Some(breakdown) = result.mao_breakdown() {
        println!("{}", style("MAO breakdown").bold());
        println!("  Base MAO          {}", format_currency(breakdown.base_mao));
        println!("  Repairs          -{}", format_currency(breakdown.estimated_repairs));
        println!("  Total fees       -{}", format_currency(breakdown.total_fees));
    }
}

/// `Base $30,000 + roof $8,000 + 10% buffer`; zero items are left out
fn repair_breakdown_line(breakdown: &RepairBreakdown) -> String {
    let mut line = format!("Base {}", format_currency(breakdown.base_rehab));
    let positive = |v: Option<f64>| v.filter(|v| *v > 0.0);
    if let Some(roof) = positive(breakdown.roof_cost) {
        line.push_str(&format!(" + roof {}", format_currency(Some(roof))));
    }
    if let Some(hvac) = positive(breakdown.hvac_cost) {
        line.push_str(&format!(" + HVAC {}", format_currency(Some(hvac))));
    }
    if let Some(buffer) = positive(breakdown.buffer_percent) {
        line.push_str(&format!(" + {}% buffer", buffer));
    }
    line
}
