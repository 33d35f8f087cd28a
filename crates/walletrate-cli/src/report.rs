//! Text and JSON rendering of ratings, score rankings and the taxonomy.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use walletrate_core::{
    AttributeRegistry, EvaluationTree, OverallScore, Rating, RatedWallet, Scorer, Variant,
    VariantSpecificity, WalletMetadata,
};

use crate::cli::OutputFormat;

#[derive(Serialize)]
struct RatingReport<'a> {
    rated_at: DateTime<Utc>,
    wallets: Vec<WalletReport<'a>>,
}

#[derive(Serialize)]
struct WalletReport<'a> {
    metadata: &'a WalletMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    variant: Option<Variant>,
    score: Option<OverallScore>,
    evaluations: &'a EvaluationTree,
    /// Attributes rated differently elsewhere, per variant
    divergences: Vec<(Variant, &'a BTreeSet<&'static str>)>,
}

fn tree_for(wallet: &RatedWallet, variant: Option<Variant>) -> &EvaluationTree {
    match variant.and_then(|v| wallet.variants.get(&v)) {
        Some(tree) => tree,
        None => &wallet.overall,
    }
}

fn rating_label(rating: Rating) -> String {
    format!("{:<8}", rating.to_string())
}

pub(crate) fn print_ratings(
    registry: &AttributeRegistry,
    wallets: &[RatedWallet],
    variant: Option<Variant>,
    format: OutputFormat,
) -> Result<()> {
    let scorer = Scorer::new(registry);

    if format == OutputFormat::Json {
        let mut reports = Vec::with_capacity(wallets.len());
        for wallet in wallets {
            let tree = tree_for(wallet, variant);
            reports.push(WalletReport {
                metadata: &wallet.metadata,
                variant,
                score: scorer.overall(tree)?,
                evaluations: tree,
                divergences: wallet
                    .divergences
                    .iter()
                    .filter(|(v, _)| variant.map_or(true, |selected| selected == **v))
                    .map(|(v, set)| (*v, set))
                    .collect(),
            });
        }
        let report = RatingReport {
            rated_at: Utc::now(),
            wallets: reports,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for wallet in wallets {
        print_wallet_text(&scorer, wallet, variant)?;
    }
    Ok(())
}

fn print_wallet_text(scorer: &Scorer<'_>, wallet: &RatedWallet, variant: Option<Variant>) -> Result<()> {
    let tree = tree_for(wallet, variant);
    let variants = wallet
        .variants
        .keys()
        .map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    println!("{} ({})", wallet.metadata.display_name, wallet.metadata.id);
    println!(
        "  profile: {:?}, variants: {}, showing: {}",
        wallet.profile,
        variants,
        variant.map_or("aggregate", Variant::as_str)
    );

    let scores = scorer.overall(tree)?;
    match &scores {
        Some(overall) => println!(
            "  overall score: {:.2}{}",
            overall.score,
            if overall.has_unrated { " (some attributes unrated)" } else { "" }
        ),
        None => println!("  overall score: n/a"),
    }

    for (group_id, group) in &tree.groups {
        let group_score = scores
            .as_ref()
            .and_then(|s| s.groups.get(group_id))
            .filter(|g| !g.fully_exempt)
            .map_or("n/a".to_string(), |g| format!("{:.2}", g.score));
        println!();
        println!("  [{group_id}] {group_score}");

        for (attribute_id, evaluation) in &group.attributes {
            let marker = match variant {
                Some(v) => match wallet.variant_specificity(v, attribute_id) {
                    Some(VariantSpecificity::UniqueToVariant) => "  (unique to this variant)",
                    _ => "",
                },
                None if wallet.has_divergence(attribute_id) => "  (varies by variant)",
                None => "",
            };
            println!(
                "    {:<32} {} {}{}",
                attribute_id,
                rating_label(evaluation.rating()),
                evaluation.value.display_name,
                marker
            );
            println!("      {}", evaluation.details);
            if let Some(how) = &evaluation.how_to_improve {
                println!("      improve: {how}");
            }
        }
    }
    println!();
    Ok(())
}

#[derive(Serialize)]
struct ScoreRow<'a> {
    rank: usize,
    id: &'a str,
    display_name: &'a str,
    score: Option<OverallScore>,
}

/// Highest score first, unscored wallets last, ties by id.
fn ranking_order(a: (&str, Option<f64>), b: (&str, Option<f64>)) -> Ordering {
    match (a.1, b.1) {
        (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.0.cmp(b.0)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.0.cmp(b.0),
    }
}

pub(crate) fn print_scores(
    registry: &AttributeRegistry,
    wallets: &[RatedWallet],
    format: OutputFormat,
) -> Result<()> {
    let mut scored = Vec::with_capacity(wallets.len());
    for wallet in wallets {
        scored.push((wallet, wallet.score(registry)?));
    }
    scored.sort_by(|(a, sa), (b, sb)| {
        ranking_order(
            (a.metadata.id.as_str(), sa.as_ref().map(|s| s.score)),
            (b.metadata.id.as_str(), sb.as_ref().map(|s| s.score)),
        )
    });

    let rows: Vec<ScoreRow<'_>> = scored
        .into_iter()
        .enumerate()
        .map(|(i, (wallet, score))| ScoreRow {
            rank: i + 1,
            id: &wallet.metadata.id,
            display_name: &wallet.metadata.display_name,
            score,
        })
        .collect();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let groups: Vec<&str> = registry.groups().iter().map(|g| g.id).collect();
    print!("{:<5} {:<20} {:>7}", "rank", "wallet", "overall");
    for group in &groups {
        print!(" {:>16}", group);
    }
    println!();

    for row in &rows {
        let overall = row
            .score
            .as_ref()
            .map_or("n/a".to_string(), |s| {
                format!("{:.2}{}", s.score, if s.has_unrated { "*" } else { "" })
            });
        print!("{:<5} {:<20} {:>7}", row.rank, row.display_name, overall);
        for group in &groups {
            let cell = row
                .score
                .as_ref()
                .and_then(|s| s.groups.get(group))
                .filter(|g| !g.fully_exempt)
                .map_or("n/a".to_string(), |g| format!("{:.2}", g.score));
            print!(" {:>16}", cell);
        }
        println!();
    }
    println!("* includes unrated attributes");
    Ok(())
}

pub(crate) fn print_attributes(registry: &AttributeRegistry, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(registry)?);
        return Ok(());
    }

    for group in registry.groups() {
        println!("{} ({})", group.display_name, group.id);
        for attribute in &group.attributes {
            let weight = group.weights.get(attribute.id).copied().unwrap_or_default();
            println!("  {} (weight {})", attribute.id, weight);
            println!("    {}", attribute.question);
            println!("    {}", attribute.methodology);
            if !attribute.exempt_for.is_empty() {
                println!("    exempt for: {:?}", attribute.exempt_for);
            }
            for outcome in &attribute.outcomes {
                println!("    - {} {}", rating_label(outcome.rating), outcome.id);
            }
        }
        println!();
    }
    Ok(())
}
