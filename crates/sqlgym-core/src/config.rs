use crate::errors::ConfigError;
use crate::model::GymConfig;
use std::collections::HashSet;
use std::path::Path;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

pub fn load_config(path: &Path, strict: bool) -> Result<GymConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    parse_config(&raw, strict)
        .map_err(|ConfigError(msg)| ConfigError(format!("{} (file: {})", msg, path.display())))
}

pub fn parse_config(raw: &str, strict: bool) -> Result<GymConfig, ConfigError> {
    let mut ignored_keys = HashSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(raw);

    let mut cfg: GymConfig = serde_ignored::deserialize(deserializer, |path| {
        ignored_keys.insert(path.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;

    // anchors and extension keys are allowed anywhere
    let mut unknown: Vec<String> = ignored_keys
        .into_iter()
        .filter(|k| !k.starts_with('_') && !k.starts_with("x-") && !k.contains(".x-"))
        .collect();
    unknown.sort();

    if !unknown.is_empty() {
        if strict {
            return Err(ConfigError(format!(
                "Unknown fields detected in strict mode: {:?}",
                unknown
            )));
        }
        tracing::warn!(event = "config.ignored_fields", fields = ?unknown, "ignored unknown config fields");
    }

    if cfg.version == 0 {
        cfg.version = SUPPORTED_CONFIG_VERSION;
    }
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }

    apply_env_overrides(&mut cfg);
    validate(&cfg)?;
    Ok(cfg)
}

/// `SQLGYM_MAX_POOL_SIZE`, `SQLGYM_MAX_INSTANCES` and `SQLGYM_TIMEOUT_MS` win over the file.
pub fn apply_env_overrides(cfg: &mut GymConfig) {
    if let Some(n) = env_number("SQLGYM_MAX_POOL_SIZE") {
        cfg.settings.pool.max_pool_size = n as usize;
    }
    if let Some(n) = env_number("SQLGYM_MAX_INSTANCES") {
        cfg.settings.pool.max_total_instances = n as usize;
    }
    if let Some(n) = env_number("SQLGYM_TIMEOUT_MS") {
        cfg.settings.statement_timeout_ms = Some(n);
    }
}

fn env_number(key: &str) -> Option<u64> {
    let v = std::env::var(key).ok()?;
    match v.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(event = "config.bad_env", key = key, value = %v, "ignoring non-numeric override");
            None
        }
    }
}

pub fn validate(cfg: &GymConfig) -> Result<(), ConfigError> {
    let pool = &cfg.settings.pool;
    if pool.max_total_instances == 0 {
        return Err(ConfigError(
            "settings.pool.max_total_instances must be at least 1".into(),
        ));
    }
    if pool.max_pool_size == 0 {
        return Err(ConfigError(
            "settings.pool.max_pool_size must be at least 1".into(),
        ));
    }

    let mut seen = HashSet::new();
    for c in &cfg.challenges {
        if c.id.trim().is_empty() {
            return Err(ConfigError("challenge with empty id".into()));
        }
        if !seen.insert(c.id.as_str()) {
            return Err(ConfigError(format!("duplicate challenge id '{}'", c.id)));
        }
        if c.solution_sql.trim().is_empty() {
            return Err(ConfigError(format!(
                "challenge '{}' has an empty solution_sql",
                c.id
            )));
        }
    }
    Ok(())
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, SAMPLE_CONFIG)
        .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}

pub const SAMPLE_CONFIG: &str = r#"configVersion: 1
settings:
  pool:
    max_pool_size: 2
    max_total_instances: 10
  statement_timeout_ms: 5000
  column_matching: values
challenges:
  - id: emp-basic-list
    title: Employee roster
    prompt: List employee full names with their titles, sorted alphabetically by last name.
    difficulty: beginner
    points: 50
    database: employees
    starter_sql: SELECT first_name, last_name, title FROM employees ORDER BY last_name;
    solution_sql: SELECT first_name || ' ' || last_name AS employee, title FROM employees ORDER BY last_name;
    concepts: [SELECT, ORDER BY]
  - id: emp-count-dept
    title: Headcount by department
    prompt: Show how many employees sit in each department, highest first.
    difficulty: beginner
    points: 55
    database: employees
    solution_sql: SELECT d.name AS department, COUNT(*) AS employee_count FROM departments d JOIN employees e ON e.department_id = d.id GROUP BY d.name ORDER BY employee_count DESC;
    concepts: [GROUP BY, COUNT, JOIN]
  - id: emp-hired-after-2020
    title: Recent hires
    prompt: Return employees hired from 2020 onward with their hire dates, oldest to newest.
    difficulty: beginner
    points: 55
    database: employees
    solution_sql: SELECT first_name, last_name, hire_date FROM employees WHERE hire_date >= '2020-01-01' ORDER BY hire_date;
    concepts: [WHERE, DATE]
  - id: emp-salary-threshold
    title: High earners
    prompt: Find employees making $120k or more, ordered by salary descending.
    difficulty: beginner
    points: 60
    database: employees
    solution_sql: SELECT first_name, last_name, title, salary FROM employees WHERE salary >= 120000 ORDER BY salary DESC;
    concepts: [WHERE, ORDER BY]
  - id: emp-manager-names
    title: Managers & reports
    prompt: Show each employee with their manager name (or "(exec)" when none).
    difficulty: intermediate
    points: 70
    database: employees
    solution_sql: SELECT e.first_name || ' ' || e.last_name AS employee, COALESCE(m.first_name || ' ' || m.last_name, '(exec)') AS manager FROM employees e LEFT JOIN employees m ON e.manager_id = m.id ORDER BY employee;
    concepts: [SELF JOIN, COALESCE]
  - id: emp-avg-salary-dept
    title: Above-average departments
    prompt: Return departments whose average salary is over $100k, sorted by average salary.
    difficulty: intermediate
    points: 75
    database: employees
    solution_sql: SELECT d.name AS department, ROUND(AVG(e.salary)) AS avg_salary FROM departments d JOIN employees e ON e.department_id = d.id GROUP BY d.name HAVING AVG(e.salary) > 100000 ORDER BY avg_salary DESC;
    concepts: [AVG, HAVING, GROUP BY]
  - id: emp-salary-growth
    title: Who got the biggest raises
    prompt: Using salary history, show employees whose latest salary is at least $10k above their first recorded salary.
    difficulty: intermediate
    points: 80
    database: employees
    solution_sql: SELECT e.first_name, e.last_name, MAX(s.amount) - MIN(s.amount) AS growth FROM salaries s JOIN employees e ON e.id = s.employee_id GROUP BY e.id, e.first_name, e.last_name HAVING MAX(s.amount) - MIN(s.amount) >= 10000 ORDER BY growth DESC;
    concepts: [HAVING, AGGREGATES]
  - id: emp-window-rank
    title: Top earners per department
    prompt: Rank salaries within each department and keep the top two.
    difficulty: advanced
    points: 100
    database: employees
    solution_sql: SELECT department, employee, salary, salary_rank FROM (SELECT d.name AS department, e.first_name || ' ' || e.last_name AS employee, e.salary, DENSE_RANK() OVER (PARTITION BY d.id ORDER BY e.salary DESC) AS salary_rank FROM employees e JOIN departments d ON d.id = e.department_id WHERE salary IS NOT NULL) ranked WHERE salary_rank <= 2 ORDER BY department, salary_rank;
    concepts: [WINDOW, DENSE_RANK, PARTITION BY]
  - id: emp-tenure-buckets
    title: Tenure buckets
    prompt: Compute whole years at the company as of 2024-12-31 and bucket employees into career stages.
    difficulty: advanced
    points: 85
    database: employees
    solution_sql: SELECT employee, years_at_company, CASE WHEN years_at_company >= 8 THEN 'veteran' WHEN years_at_company >= 4 THEN 'established' WHEN years_at_company >= 2 THEN 'mid-level' ELSE 'new hire' END AS tenure_bucket FROM (SELECT first_name || ' ' || last_name AS employee, CAST((julianday('2024-12-31') - julianday(hire_date)) / 365.25 AS INTEGER) AS years_at_company FROM employees) t ORDER BY years_at_company DESC;
    concepts: [CASE, DATE MATH, JULIANDAY]
  - id: emp-above-company-avg
    title: Beating the company average
    prompt: Find departments whose average salary is above the overall company average.
    difficulty: advanced
    points: 85
    database: employees
    solution_sql: WITH company AS (SELECT AVG(salary) AS avg_salary FROM employees) SELECT d.name AS department, ROUND(AVG(e.salary)) AS avg_salary FROM employees e JOIN departments d ON e.department_id = d.id GROUP BY d.name HAVING AVG(e.salary) > (SELECT avg_salary FROM company) ORDER BY avg_salary DESC;
    concepts: [CTE, AVG, HAVING]
  - id: eco-latest-orders
    title: Latest orders
    prompt: List the five most recent orders with customer names and status.
    difficulty: beginner
    points: 50
    database: ecommerce
    solution_sql: SELECT o.id, c.name AS customer, o.status, o.order_date FROM orders o JOIN customers c ON c.id = o.customer_id ORDER BY o.order_date DESC LIMIT 5;
    concepts: [JOIN, ORDER BY, LIMIT]
  - id: eco-status-count
    title: Orders by status
    prompt: Count orders per status, most common first.
    difficulty: beginner
    points: 50
    database: ecommerce
    solution_sql: SELECT status, COUNT(*) AS total FROM orders GROUP BY status ORDER BY total DESC;
    concepts: [GROUP BY, COUNT]
  - id: eco-expensive-products
    title: Premium catalog
    prompt: List products priced above $50, most expensive first.
    difficulty: beginner
    points: 50
    database: ecommerce
    solution_sql: SELECT name, category, price FROM products WHERE price > 50 ORDER BY price DESC;
    concepts: [WHERE, ORDER BY]
  - id: eco-new-customers
    title: Recent signups
    prompt: Return customers who joined in 2023 or later with their country.
    difficulty: beginner
    points: 55
    database: ecommerce
    solution_sql: SELECT name, country, signup_date FROM customers WHERE signup_date >= '2023-01-01' ORDER BY signup_date;
    concepts: [DATE, FILTERS]
  - id: eco-revenue-per-customer
    title: Revenue per customer
    prompt: Total revenue per customer across all their order items.
    difficulty: intermediate
    points: 75
    database: ecommerce
    solution_sql: SELECT c.name AS customer, ROUND(SUM(oi.quantity * oi.unit_price), 2) AS revenue FROM customers c JOIN orders o ON o.customer_id = c.id JOIN order_items oi ON oi.order_id = o.id GROUP BY c.name ORDER BY revenue DESC;
    concepts: [SUM, JOIN, GROUP BY]
  - id: eco-monthly-orders
    title: Monthly order volume
    prompt: Count orders per month, formatted as YYYY-MM.
    difficulty: intermediate
    points: 70
    database: ecommerce
    solution_sql: SELECT strftime('%Y-%m', order_date) AS month, COUNT(*) AS orders FROM orders GROUP BY 1 ORDER BY 1;
    concepts: [STRFTIME, GROUP BY, FORMAT]
  - id: eco-top-categories
    title: Top categories by items sold
    prompt: Sum quantities sold per product category and order by volume.
    difficulty: intermediate
    points: 75
    database: ecommerce
    solution_sql: SELECT p.category, SUM(oi.quantity) AS items_sold FROM order_items oi JOIN products p ON p.id = oi.product_id GROUP BY p.category ORDER BY items_sold DESC;
    concepts: [SUM, GROUP BY, JOIN]
  - id: eco-repeat-customers
    title: Repeat customers
    prompt: Customers with at least two orders.
    difficulty: intermediate
    points: 70
    database: ecommerce
    solution_sql: SELECT c.name, COUNT(DISTINCT o.id) AS orders FROM customers c JOIN orders o ON o.customer_id = c.id GROUP BY c.name HAVING COUNT(DISTINCT o.id) >= 2 ORDER BY orders DESC;
    concepts: [HAVING, COUNT DISTINCT]
  - id: eco-high-value-orders
    title: Above-average order totals
    prompt: Compute order totals and return those above the average order total.
    difficulty: advanced
    points: 90
    database: ecommerce
    solution_sql: WITH totals AS (SELECT o.id, SUM(oi.quantity * oi.unit_price) AS total FROM orders o JOIN order_items oi ON oi.order_id = o.id GROUP BY o.id) SELECT o.id, c.name AS customer, ROUND(total, 2) AS total FROM totals t JOIN orders o ON o.id = t.id JOIN customers c ON c.id = o.customer_id WHERE total > (SELECT AVG(total) FROM totals) ORDER BY total DESC;
    concepts: [CTE, AVG, JOIN]
  - id: eco-top-products-revenue
    title: Top products by revenue
    prompt: Rank products by revenue with a window function and keep the top three.
    difficulty: advanced
    points: 85
    database: ecommerce
    solution_sql: WITH revenue AS (SELECT p.name, SUM(oi.quantity * oi.unit_price) AS revenue FROM order_items oi JOIN products p ON p.id = oi.product_id GROUP BY p.name), ranked AS (SELECT name, revenue, DENSE_RANK() OVER (ORDER BY revenue DESC) AS revenue_rank FROM revenue) SELECT name, ROUND(revenue, 2) AS revenue, revenue_rank FROM ranked WHERE revenue_rank <= 3 ORDER BY revenue_rank;
    concepts: [WINDOW, DENSE_RANK, SUM]
  - id: mov-top-rated
    title: Critics' picks
    prompt: Movies rated 8 or higher, best first.
    difficulty: beginner
    points: 50
    database: movies
    solution_sql: SELECT title, rating FROM movies WHERE rating >= 8 ORDER BY rating DESC;
    concepts: [FILTER, ORDER BY]
  - id: mov-genre-count
    title: Films per genre
    prompt: Count how many movies exist for each genre.
    difficulty: beginner
    points: 50
    database: movies
    solution_sql: SELECT genre, COUNT(*) AS movie_count FROM movies GROUP BY genre ORDER BY movie_count DESC;
    concepts: [GROUP BY, COUNT]
  - id: mov-inception-cast
    title: Inception cast list
    prompt: Show actors and roles for the movie 'Inception' ordered by actor name.
    difficulty: beginner
    points: 55
    database: movies
    solution_sql: SELECT a.name, r.role FROM roles r JOIN actors a ON a.id = r.actor_id JOIN movies m ON m.id = r.movie_id WHERE m.title = 'Inception' ORDER BY a.name;
    concepts: [JOIN, WHERE]
  - id: mov-recent-films
    title: Recent releases
    prompt: Return movies released in or after 2018, newest first.
    difficulty: beginner
    points: 55
    database: movies
    solution_sql: SELECT title, released_year FROM movies WHERE released_year >= 2018 ORDER BY released_year DESC;
    concepts: [FILTER, ORDER BY]
  - id: mov-director-filmography
    title: Directors with multiple films
    prompt: List directors who have at least two films in the catalog.
    difficulty: intermediate
    points: 70
    database: movies
    solution_sql: SELECT d.name, COUNT(md.movie_id) AS films FROM directors d JOIN movie_directors md ON md.director_id = d.id GROUP BY d.name HAVING COUNT(md.movie_id) >= 2 ORDER BY films DESC;
    concepts: [HAVING, JOIN, COUNT]
  - id: mov-actors-multi
    title: Frequent actors
    prompt: Find actors who appear in more than one movie.
    difficulty: intermediate
    points: 70
    database: movies
    solution_sql: SELECT a.name, COUNT(DISTINCT r.movie_id) AS appearances FROM actors a JOIN roles r ON r.actor_id = a.id GROUP BY a.name HAVING COUNT(DISTINCT r.movie_id) > 1 ORDER BY appearances DESC, a.name;
    concepts: [COUNT DISTINCT, HAVING]
  - id: mov-director-top-rated
    title: Top film per director
    prompt: Use a window function to return the highest-rated movie of each director.
    difficulty: intermediate
    points: 80
    database: movies
    solution_sql: WITH ranked AS (SELECT d.name, m.title, m.rating, DENSE_RANK() OVER (PARTITION BY d.id ORDER BY m.rating DESC) AS rnk FROM directors d JOIN movie_directors md ON md.director_id = d.id JOIN movies m ON m.id = md.movie_id) SELECT name, title, rating FROM ranked WHERE rnk = 1 ORDER BY rating DESC;
    concepts: [WINDOW, DENSE_RANK, PARTITION BY]
  - id: mov-co-actors
    title: Co-actors with Mara Steele
    prompt: List distinct co-actors who have appeared with Mara Steele.
    difficulty: advanced
    points: 85
    database: movies
    solution_sql: SELECT DISTINCT a2.name AS co_actor FROM roles r1 JOIN roles r2 ON r1.movie_id = r2.movie_id AND r1.actor_id <> r2.actor_id JOIN actors a1 ON a1.id = r1.actor_id JOIN actors a2 ON a2.id = r2.actor_id WHERE a1.name = 'Mara Steele' ORDER BY co_actor;
    concepts: [SELF JOIN, DISTINCT]
  - id: mov-genre-delta
    title: Genre vs. overall rating
    prompt: Average rating per genre and its difference from the overall average.
    difficulty: advanced
    points: 90
    database: movies
    solution_sql: WITH genre_avg AS (SELECT genre, AVG(rating) AS avg_rating FROM movies GROUP BY genre), overall AS (SELECT AVG(rating) AS avg_rating FROM movies) SELECT g.genre, ROUND(g.avg_rating, 2) AS genre_rating, ROUND(g.avg_rating - o.avg_rating, 2) AS delta FROM genre_avg g, overall o ORDER BY delta DESC;
    concepts: [CTE, AVG, CROSS JOIN]
  - id: mov-boxoffice-rank
    title: Box office ranking
    prompt: Rank movies by box office revenue using a window function.
    difficulty: advanced
    points: 85
    database: movies
    solution_sql: SELECT title, box_office, RANK() OVER (ORDER BY box_office DESC) AS revenue_rank FROM movies ORDER BY revenue_rank;
    concepts: [RANK, WINDOW]
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnMatching, SchemaId};

    #[test]
    fn test_sample_config_parses() {
        let cfg = parse_config(SAMPLE_CONFIG, true).unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.challenges.len(), 30);
        assert_eq!(cfg.settings.column_matching, ColumnMatching::Values);
        let c = cfg.challenge("mov-top-rated").unwrap();
        assert_eq!(c.database, SchemaId::Movies);
        assert_eq!(cfg.filter(Some("window"), None).len(), 4);
    }

    #[test]
    fn test_defaults_apply_when_settings_missing() {
        let cfg = parse_config("challenges: []\n", true).unwrap();
        assert_eq!(cfg.settings.pool.max_pool_size, 2);
        assert_eq!(cfg.settings.pool.max_total_instances, 10);
    }

    #[test]
    fn test_strict_rejects_unknown_fields() {
        let raw = "configVersion: 1\nsettings:\n  pool:\n    max_idle: 3\n";
        let err = parse_config(raw, true).unwrap_err();
        assert!(err.0.contains("settings.pool.max_idle"), "{}", err);

        // lenient mode only warns
        assert!(parse_config(raw, false).is_ok());
    }

    #[test]
    fn test_unknown_database_is_config_error() {
        let raw = r#"
challenges:
  - id: x
    title: X
    database: payroll
    solution_sql: SELECT 1
"#;
        let err = parse_config(raw, false).unwrap_err();
        assert!(err.0.contains("failed to parse YAML"), "{}", err);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let raw = r#"
challenges:
  - { id: a, title: A, database: movies, solution_sql: SELECT 1 }
  - { id: a, title: B, database: movies, solution_sql: SELECT 2 }
"#;
        let err = parse_config(raw, false).unwrap_err();
        assert!(err.0.contains("duplicate challenge id 'a'"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let raw = "settings:\n  pool:\n    max_total_instances: 0\n";
        assert!(parse_config(raw, false).is_err());
    }

    #[test]
    fn test_unsupported_version() {
        let err = parse_config("configVersion: 7\n", false).unwrap_err();
        assert!(err.0.contains("unsupported config version 7"));
    }

    #[test]
    fn test_load_config_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqlgym.yaml");
        write_sample_config(&path).unwrap();
        assert!(load_config(&path, true).is_ok());

        std::fs::write(&path, "configVersion: 9\n").unwrap();
        let err = load_config(&path, true).unwrap_err();
        assert!(err.0.contains("sqlgym.yaml"));
    }
}
