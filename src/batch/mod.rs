//! Domain-aware batching of discovered files.
//!
//! Files are first classified into architectural-role categories (so a
//! batch stays thematically coherent: all request-handling code together,
//! all styling together), then packed into size-bounded batches within
//! each category. Categories are processed independently and never merged.
//!
//! Boundary rule: a new batch opens only when adding the next file would
//! make the cumulative size strictly exceed the budget; a cumulative size
//! exactly equal to the budget stays in the current batch. A single file
//! larger than the whole budget becomes its own one-file batch.

use indexmap::IndexMap;
use strum::{Display, EnumString};

use crate::constants::MAX_CHARS_PER_BATCH;
use crate::discovery::ReviewableFile;

/// A size-bounded, category-homogeneous group of files reviewed together.
pub type Batch = Vec<ReviewableFile>;

/// Grouping strategy identifiers, one per profile family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum GroupStrategy {
    /// Template hierarchy vs. partials vs. bootstrap code vs. assets.
    WpTheme,
    /// Entry point vs. admin vs. request handlers vs. data access vs. assets.
    WpPlugin,
    /// Controllers, models, policies, views, and the Filament/API layers.
    Laravel,
    /// Everything in one category.
    Flat,
}

/// Plan batches for the discovered files under the given strategy.
pub fn plan_batches(files: Vec<ReviewableFile>, strategy: GroupStrategy) -> Vec<Batch> {
    let classify: fn(&ReviewableFile) -> &'static str = match strategy {
        GroupStrategy::WpTheme => classify_wp_theme,
        GroupStrategy::WpPlugin => classify_wp_plugin,
        GroupStrategy::Laravel => classify_laravel,
        GroupStrategy::Flat => |_| "all",
    };

    // IndexMap keeps categories in first-seen order; combined with the
    // deterministic discovery order this makes batch output stable.
    let mut groups: IndexMap<&'static str, Vec<ReviewableFile>> = IndexMap::new();
    for category in category_order(strategy) {
        groups.insert(category, Vec::new());
    }
    for file in files {
        let category = classify(&file);
        groups.entry(category).or_default().push(file);
    }

    let mut batches = Vec::new();
    for (_, group) in groups {
        pack_group(group, MAX_CHARS_PER_BATCH, &mut batches);
    }
    batches
}

/// Fixed category order per strategy. Classification precedence is the
/// predicate order inside each `classify_*` function; this list only fixes
/// the order in which categories emit their batches.
fn category_order(strategy: GroupStrategy) -> &'static [&'static str] {
    match strategy {
        GroupStrategy::WpTheme => &[
            "functions",
            "template_hierarchy",
            "partials",
            "theme_php",
            "javascript",
            "css",
            "config",
            "other",
        ],
        GroupStrategy::WpPlugin => &[
            "main_plugin",
            "admin",
            "includes",
            "public_facing",
            "ajax_rest",
            "database",
            "javascript",
            "css",
            "config",
            "other",
        ],
        GroupStrategy::Laravel => &[
            "filament_resources",
            "filament_pages_widgets",
            "api_controllers",
            "api_resources",
            "controllers",
            "form_requests",
            "models",
            "policies",
            "middleware",
            "routes",
            "services",
            "migrations",
            "views",
            "javascript",
            "config",
            "other",
        ],
        GroupStrategy::Flat => &["all"],
    }
}

/// Pack one category's files into batches, in their discovered order.
fn pack_group(group: Vec<ReviewableFile>, budget: usize, batches: &mut Vec<Batch>) {
    let mut current: Batch = Vec::new();
    let mut size = 0usize;

    for file in group {
        let file_size = file.content.len();

        if size + file_size > budget && !current.is_empty() {
            batches.push(std::mem::take(&mut current));
            size = 0;
        }
        if file_size > budget {
            // Oversized file: flush anything in progress, then go alone.
            if !current.is_empty() {
                batches.push(std::mem::take(&mut current));
                size = 0;
            }
            batches.push(vec![file]);
            continue;
        }
        current.push(file);
        size += file_size;
    }

    if !current.is_empty() {
        batches.push(current);
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn ends_with_any(path: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|s| path.ends_with(s))
}

/// Theme files by role: bootstrap code, template hierarchy, shared
/// partials, remaining PHP, then assets. First predicate wins.
fn classify_wp_theme(file: &ReviewableFile) -> &'static str {
    let p = file.path.to_lowercase();
    let name = basename(&p);

    if p.contains("functions.php")
        || ((p.contains("inc/") || p.contains("includes/")) && p.ends_with(".php"))
    {
        "functions"
    } else if p.ends_with(".php")
        && [
            "index.php",
            "single",
            "page",
            "archive",
            "search",
            "404",
            "home",
            "front-page",
            "category",
            "tag",
            "taxonomy",
            "author",
            "date",
            "attachment",
            "image",
            "comments",
        ]
        .iter()
        .any(|k| name.contains(k))
    {
        "template_hierarchy"
    } else if p.ends_with(".php")
        && ["header", "footer", "sidebar", "template-parts/", "parts/", "partials/", "components/"]
            .iter()
            .any(|k| p.contains(k))
    {
        "partials"
    } else if ends_with_any(&p, &[".php", ".twig"]) {
        "theme_php"
    } else if ends_with_any(&p, &[".js", ".jsx", ".ts", ".tsx"]) {
        "javascript"
    } else if ends_with_any(&p, &[".css", ".scss"]) {
        "css"
    } else if ends_with_any(&p, &[".json", ".yml", ".yaml", ".xml", ".conf", ".htaccess"]) {
        "config"
    } else {
        "other"
    }
}

/// Plugin files by role: entry point, admin code, request handlers,
/// data access, public-facing code, core includes, then assets.
fn classify_wp_plugin(file: &ReviewableFile) -> &'static str {
    let p = file.path.to_lowercase();
    let name = basename(&p);
    let depth = p.trim_matches('/').matches('/').count();

    if depth == 0 && p.ends_with(".php") {
        "main_plugin"
    } else if p.contains("admin/") || name.contains("admin-") || name.contains("settings") {
        "admin"
    } else if ["ajax", "rest-api", "rest/", "api/", "endpoints"]
        .iter()
        .any(|k| p.contains(k))
    {
        "ajax_rest"
    } else if ["database", "migration", "table", "schema", "install"]
        .iter()
        .any(|k| p.contains(k))
    {
        "database"
    } else if p.contains("public/") || p.contains("frontend/") {
        "public_facing"
    } else if p.ends_with(".php") {
        "includes"
    } else if ends_with_any(&p, &[".js", ".jsx", ".ts", ".tsx"]) {
        "javascript"
    } else if ends_with_any(&p, &[".css", ".scss"]) {
        "css"
    } else if ends_with_any(&p, &[".json", ".yml", ".yaml", ".xml"]) {
        "config"
    } else {
        "other"
    }
}

/// Laravel files with Filament and API awareness.
fn classify_laravel(file: &ReviewableFile) -> &'static str {
    let p = file.path.to_lowercase();
    let name = basename(&p);

    if p.contains("filament/")
        && (p.contains("resource") || name.contains("relationmanager") || name.contains("relation"))
    {
        "filament_resources"
    } else if p.contains("filament/") {
        "filament_pages_widgets"
    } else if p.contains("api/") && p.contains("controller") {
        "api_controllers"
    } else if p.contains("resources/") && name.contains("resource.php") && p.ends_with(".php") {
        "api_resources"
    } else if p.contains("controller") {
        "controllers"
    } else if p.contains("request") && p.ends_with(".php") && p.contains("http/") {
        "form_requests"
    } else if p.contains("/models/") {
        "models"
    } else if p.contains("polic") {
        "policies"
    } else if p.contains("middleware") {
        "middleware"
    } else if p.contains("routes/") {
        "routes"
    } else if p.contains("views/") || p.ends_with(".blade.php") {
        "views"
    } else if p.contains("migration") {
        "migrations"
    } else if ["services/", "actions/", "jobs/", "events/", "listeners/", "notifications/"]
        .iter()
        .any(|k| p.contains(k))
    {
        "services"
    } else if ends_with_any(&p, &[".js", ".jsx", ".ts", ".tsx", ".vue"]) {
        "javascript"
    } else if ends_with_any(&p, &[".json", ".yml", ".yaml"]) {
        "config"
    } else {
        "other"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, chars: usize) -> ReviewableFile {
        ReviewableFile {
            path: path.to_string(),
            content: "x".repeat(chars),
            size: chars as u64,
        }
    }

    #[test]
    fn four_files_exactly_at_budget_form_one_batch() {
        // 4 × 3000 == 12000: cumulative equals the budget, never exceeds it.
        let files = (0..4).map(|i| file(&format!("f{i}.php"), 3_000)).collect();
        let batches = plan_batches(files, GroupStrategy::Flat);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 4);
    }

    #[test]
    fn exceeding_budget_opens_new_batch() {
        let files = (0..4).map(|i| file(&format!("f{i}.php"), 3_001)).collect();
        let batches = plan_batches(files, GroupStrategy::Flat);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(batches[1].len(), 1);
    }

    #[test]
    fn oversized_file_goes_alone() {
        let files = vec![
            file("small1.php", 1_000),
            file("huge.php", MAX_CHARS_PER_BATCH + 1),
            file("small2.php", 1_000),
        ];
        let batches = plan_batches(files, GroupStrategy::Flat);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0][0].path, "small1.php");
        assert_eq!(batches[1][0].path, "huge.php");
        assert_eq!(batches[1].len(), 1);
        assert_eq!(batches[2][0].path, "small2.php");
    }

    #[test]
    fn batches_never_mix_categories() {
        let files = vec![
            file("app.js", 100),
            file("style.css", 100),
            file("other.js", 100),
        ];
        let batches = plan_batches(files, GroupStrategy::WpTheme);
        // javascript and css are separate categories even though all three
        // would fit in a single budget.
        assert_eq!(batches.len(), 2);
        assert!(batches[0].iter().all(|f| f.path.ends_with(".js")));
        assert!(batches[1].iter().all(|f| f.path.ends_with(".css")));
    }

    #[test]
    fn categories_emit_in_policy_order() {
        // wp-plugin: core includes come before request handlers and
        // database code in the report, whatever order discovery found them.
        let files = vec![
            file("includes/rest/routes.php", 100),
            file("includes/database/schema.php", 100),
            file("includes/helpers.php", 100),
            file("admin/settings-page.php", 100),
        ];
        let batches = plan_batches(files, GroupStrategy::WpPlugin);
        let order: Vec<&str> = batches.iter().map(|b| b[0].path.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "admin/settings-page.php",
                "includes/helpers.php",
                "includes/rest/routes.php",
                "includes/database/schema.php",
            ]
        );

        // laravel: services ahead of migrations, views last of the PHP set.
        let files = vec![
            file("resources/views/orders/index.blade.php", 100),
            file("database/migrations/2024_create_orders.php", 100),
            file("app/jobs/syncorders.php", 100),
        ];
        let batches = plan_batches(files, GroupStrategy::Laravel);
        let order: Vec<&str> = batches.iter().map(|b| b[0].path.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "app/jobs/syncorders.php",
                "database/migrations/2024_create_orders.php",
                "resources/views/orders/index.blade.php",
            ]
        );
    }

    #[test]
    fn empty_input_produces_no_batches() {
        let batches = plan_batches(Vec::new(), GroupStrategy::Laravel);
        assert!(batches.is_empty());
    }

    #[test]
    fn every_batch_is_within_budget_or_singleton() {
        let files = vec![
            file("a.php", 5_000),
            file("b.php", 5_000),
            file("c.php", 5_000),
            file("d.php", 20_000),
        ];
        let batches = plan_batches(files, GroupStrategy::Flat);
        for batch in &batches {
            let total: usize = batch.iter().map(|f| f.content.len()).sum();
            assert!(total <= MAX_CHARS_PER_BATCH || batch.len() == 1);
        }
    }

    #[test]
    fn wp_theme_classification() {
        assert_eq!(classify_wp_theme(&file("functions.php", 1)), "functions");
        assert_eq!(classify_wp_theme(&file("inc/setup.php", 1)), "functions");
        assert_eq!(classify_wp_theme(&file("single-post.php", 1)), "template_hierarchy");
        assert_eq!(classify_wp_theme(&file("template-parts/hero.php", 1)), "partials");
        assert_eq!(classify_wp_theme(&file("woocommerce/cart.php", 1)), "theme_php");
        assert_eq!(classify_wp_theme(&file("assets/app.js", 1)), "javascript");
        assert_eq!(classify_wp_theme(&file("style.scss", 1)), "css");
        assert_eq!(classify_wp_theme(&file("theme.json", 1)), "config");
        assert_eq!(classify_wp_theme(&file("screenshot.png", 1)), "other");
    }

    #[test]
    fn wp_plugin_classification() {
        assert_eq!(classify_wp_plugin(&file("my-plugin.php", 1)), "main_plugin");
        assert_eq!(classify_wp_plugin(&file("admin/settings-page.php", 1)), "admin");
        assert_eq!(classify_wp_plugin(&file("includes/rest/routes.php", 1)), "ajax_rest");
        assert_eq!(classify_wp_plugin(&file("includes/database/schema.php", 1)), "database");
        assert_eq!(classify_wp_plugin(&file("public/shortcodes.php", 1)), "public_facing");
        assert_eq!(classify_wp_plugin(&file("includes/helpers.php", 1)), "includes");
    }

    #[test]
    fn wp_plugin_admin_beats_api_by_predicate_order() {
        // Path matches both "admin/" and "api/" — first predicate wins.
        assert_eq!(classify_wp_plugin(&file("admin/api/keys.php", 1)), "admin");
    }

    #[test]
    fn laravel_classification() {
        assert_eq!(
            classify_laravel(&file("app/filament/resources/userresource.php", 1)),
            "filament_resources"
        );
        assert_eq!(
            classify_laravel(&file("app/http/controllers/api/ordercontroller.php", 1)),
            "api_controllers"
        );
        assert_eq!(classify_laravel(&file("app/models/order.php", 1)), "models");
        assert_eq!(classify_laravel(&file("app/policies/orderpolicy.php", 1)), "policies");
        assert_eq!(classify_laravel(&file("routes/web.php", 1)), "routes");
        assert_eq!(
            classify_laravel(&file("resources/views/orders/index.blade.php", 1)),
            "views"
        );
        assert_eq!(
            classify_laravel(&file("database/migrations/2024_create_orders.php", 1)),
            "migrations"
        );
        assert_eq!(classify_laravel(&file("app/jobs/syncorders.php", 1)), "services");
    }

    #[test]
    fn planning_is_deterministic() {
        let make = || {
            vec![
                file("functions.php", 4_000),
                file("single.php", 4_000),
                file("header.php", 4_000),
                file("app.js", 4_000),
            ]
        };
        let a = plan_batches(make(), GroupStrategy::WpTheme);
        let b = plan_batches(make(), GroupStrategy::WpTheme);
        let flatten = |batches: &[Batch]| -> Vec<String> {
            batches.iter().flat_map(|b| b.iter().map(|f| f.path.clone())).collect()
        };
        assert_eq!(flatten(&a), flatten(&b));
    }
}
