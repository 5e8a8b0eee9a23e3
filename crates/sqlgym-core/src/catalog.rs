//! Sample databases: the seed scripts and the table catalog shown to learners.
//!
//! Each seed drops every object it owns (children before parents) before
//! recreating and populating it, so it can run after a reset or on its own.

use crate::model::SchemaId;
use serde::Serialize;

const EMPLOYEES_SEED: &str = r#"
DROP TABLE IF EXISTS salaries;
DROP TABLE IF EXISTS employees;
DROP TABLE IF EXISTS departments;

CREATE TABLE departments(
  id INTEGER PRIMARY KEY,
  name TEXT,
  location TEXT
);

CREATE TABLE employees(
  id INTEGER PRIMARY KEY,
  first_name TEXT,
  last_name TEXT,
  title TEXT,
  department_id INTEGER REFERENCES departments(id),
  hire_date DATE,
  salary INTEGER,
  manager_id INTEGER REFERENCES employees(id)
);

CREATE TABLE salaries(
  id INTEGER PRIMARY KEY,
  employee_id INTEGER REFERENCES employees(id),
  amount INTEGER,
  effective_date DATE
);

INSERT INTO departments (id, name, location) VALUES
 (1,'Engineering','New York'),
 (2,'Data','Boston'),
 (3,'HR','Remote'),
 (4,'Sales','Remote'),
 (5,'Product','New York');

INSERT INTO employees (id, first_name, last_name, title, department_id, hire_date, salary, manager_id) VALUES
 (1,'Ava','Lopez','CTO',1,'2015-03-01',180000,NULL),
 (2,'Ben','Ortiz','Engineering Manager',1,'2017-06-15',150000,1),
 (3,'Chloe','Zhang','Data Lead',2,'2018-01-20',145000,1),
 (4,'Daniel','Smith','Senior Engineer',1,'2020-08-01',125000,2),
 (5,'Emily','Patel','Product Manager',5,'2021-02-14',118000,1),
 (6,'Frank','Kim','HR Lead',3,'2019-05-01',98000,1),
 (7,'Grace','Lee','Sales Manager',4,'2016-11-01',110000,1),
 (8,'Hugo','Silva','Data Analyst',2,'2022-09-12',90000,3),
 (9,'Isla','Garcia','Engineer',1,'2023-04-10',95000,2),
 (10,'Jon','Reed','Sales Associate',4,'2022-06-18',72000,7);

INSERT INTO salaries (id, employee_id, amount, effective_date) VALUES
 (1,2,130000,'2020-01-01'),
 (2,2,150000,'2023-01-01'),
 (3,4,110000,'2021-01-01'),
 (4,4,125000,'2024-01-01'),
 (5,8,82000,'2022-09-12'),
 (6,8,90000,'2024-01-01'),
 (7,9,90000,'2023-04-10'),
 (8,9,95000,'2024-06-01'),
 (9,5,105000,'2021-02-14'),
 (10,5,118000,'2023-07-01');
"#;

const ECOMMERCE_SEED: &str = r#"
DROP TABLE IF EXISTS order_items;
DROP TABLE IF EXISTS orders;
DROP TABLE IF EXISTS products;
DROP TABLE IF EXISTS customers;

CREATE TABLE customers(
  id INTEGER PRIMARY KEY,
  name TEXT,
  country TEXT,
  signup_date DATE,
  vip BOOLEAN
);

CREATE TABLE products(
  id INTEGER PRIMARY KEY,
  name TEXT,
  category TEXT,
  price NUMERIC(10,2)
);

CREATE TABLE orders(
  id INTEGER PRIMARY KEY,
  customer_id INTEGER REFERENCES customers(id),
  order_date DATE,
  status TEXT
);

CREATE TABLE order_items(
  id INTEGER PRIMARY KEY,
  order_id INTEGER REFERENCES orders(id),
  product_id INTEGER REFERENCES products(id),
  quantity INTEGER,
  unit_price NUMERIC(10,2)
);

INSERT INTO customers (id, name, country, signup_date, vip) VALUES
 (1,'Lena Rivers','US','2023-02-10',1),
 (2,'Marco Chen','CA','2022-11-05',0),
 (3,'Priya Desai','US','2024-01-22',1),
 (4,'Samir Ali','UK','2023-07-09',0),
 (5,'Taylor Brooks','US','2021-09-15',0),
 (6,'Noah Fischer','DE','2023-12-01',0),
 (7,'Mia Rossi','IT','2022-04-30',1),
 (8,'Omar Haddad','AE','2024-03-18',0);

INSERT INTO products (id, name, category, price) VALUES
 (1,'Noise Cancelling Headphones','Electronics',199.00),
 (2,'Mechanical Keyboard','Electronics',129.00),
 (3,'Standing Desk','Office',499.00),
 (4,'Ergonomic Chair','Office',389.00),
 (5,'Cold Brew Maker','Home',79.00),
 (6,'Running Shoes','Sports',120.00),
 (7,'Smartwatch','Electronics',249.00),
 (8,'LED Desk Lamp','Home',59.00),
 (9,'Wireless Mouse','Electronics',49.00);

INSERT INTO orders (id, customer_id, order_date, status) VALUES
 (1,1,'2024-01-05','delivered'),
 (2,2,'2023-12-18','delivered'),
 (3,1,'2024-02-20','processing'),
 (4,3,'2024-03-10','delivered'),
 (5,4,'2023-10-02','cancelled'),
 (6,5,'2023-08-15','delivered'),
 (7,6,'2024-01-22','processing'),
 (8,7,'2023-11-07','delivered'),
 (9,8,'2024-04-01','pending'),
 (10,2,'2023-05-19','delivered'),
 (11,3,'2024-05-05','delivered'),
 (12,7,'2024-02-11','delivered');

INSERT INTO order_items (id, order_id, product_id, quantity, unit_price) VALUES
 (1,1,1,1,199.00),(2,1,9,2,49.00),
 (3,2,3,1,499.00),
 (4,3,2,1,129.00),(5,3,5,1,79.00),
 (6,4,6,1,120.00),(7,4,7,1,249.00),
 (8,5,4,1,389.00),
 (9,6,5,2,79.00),(10,6,9,1,49.00),
 (11,7,2,1,129.00),
 (12,8,1,1,199.00),(13,8,8,1,59.00),
 (14,9,3,1,499.00),
 (15,10,6,1,120.00),(16,10,2,1,129.00),
 (17,11,7,1,249.00),(18,11,5,1,79.00),
 (19,12,4,1,389.00),(20,12,6,1,120.00);
"#;

const MOVIES_SEED: &str = r#"
DROP TABLE IF EXISTS roles;
DROP TABLE IF EXISTS movie_directors;
DROP TABLE IF EXISTS directors;
DROP TABLE IF EXISTS actors;
DROP TABLE IF EXISTS movies;

CREATE TABLE movies(
  id INTEGER PRIMARY KEY,
  title TEXT,
  released_year INTEGER,
  genre TEXT,
  rating NUMERIC(3,1),
  box_office NUMERIC(10,1)
);

CREATE TABLE actors(
  id INTEGER PRIMARY KEY,
  name TEXT,
  country TEXT
);

CREATE TABLE directors(
  id INTEGER PRIMARY KEY,
  name TEXT
);

CREATE TABLE movie_directors(
  movie_id INTEGER REFERENCES movies(id),
  director_id INTEGER REFERENCES directors(id)
);

CREATE TABLE roles(
  movie_id INTEGER REFERENCES movies(id),
  actor_id INTEGER REFERENCES actors(id),
  role TEXT
);

INSERT INTO movies (id, title, released_year, genre, rating, box_office) VALUES
 (1,'Inception',2010,'Sci-Fi',8.8,829.0),
 (2,'The Luminary',2021,'Drama',8.2,145.0),
 (3,'Neon Skies',2019,'Sci-Fi',7.5,210.0),
 (4,'Hidden Figures',2016,'Drama',7.8,236.0),
 (5,'Ocean Whispers',2023,'Adventure',8.4,320.0),
 (6,'Midnight Code',2022,'Thriller',8.1,98.0),
 (7,'Atlas Rising',2018,'Action',7.9,410.0),
 (8,'Parallel Lines',2015,'Mystery',7.3,75.0),
 (9,'Signal Lost',2024,'Sci-Fi',7.7,132.0);

INSERT INTO actors (id, name, country) VALUES
 (1,'Mara Steele','US'),
 (2,'Victor Han','KR'),
 (3,'Lina Moretti','IT'),
 (4,'Daniel Cho','US'),
 (5,'Priya Raman','IN'),
 (6,'Ethan Wilde','US'),
 (7,'Sofia Marques','BR'),
 (8,'Noah Asher','UK'),
 (9,'Carla Diaz','ES'),
 (10,'Felix Stone','CA');

INSERT INTO directors (id, name) VALUES
 (1,'Christopher Nolan'),
 (2,'Aria Bennett'),
 (3,'Kenji Sato'),
 (4,'Lila Gomez'),
 (5,'Omar Nadir'),
 (6,'Casey Wu');

INSERT INTO movie_directors (movie_id, director_id) VALUES
 (1,1),
 (2,2),
 (3,3),
 (4,4),
 (5,2),
 (6,5),
 (7,6),
 (8,6),
 (9,3);

INSERT INTO roles (movie_id, actor_id, role) VALUES
 (1,1,'Architect'),(1,2,'Extractor'),(1,3,'Chemist'),
 (2,4,'Reporter'),(2,5,'Scientist'),(2,1,'Mentor'),
 (3,2,'Pilot'),(3,6,'Navigator'),(3,7,'Mechanic'),
 (4,5,'Analyst'),(4,8,'Director'),
 (5,3,'Explorer'),(5,7,'Diver'),(5,9,'Cartographer'),
 (6,6,'Hacker'),(6,1,'Handler'),(6,10,'Analyst'),
 (7,4,'Commander'),(7,2,'Strategist'),(7,9,'Engineer'),
 (8,5,'Detective'),(8,8,'Professor'),
 (9,6,'Engineer'),(9,3,'Captain'),(9,1,'AI Voice');
"#;

/// DDL+DML that (re)creates and populates `schema` from empty.
pub fn seed(schema: SchemaId) -> &'static str {
    match schema {
        SchemaId::Employees => EMPLOYEES_SEED,
        SchemaId::Ecommerce => ECOMMERCE_SEED,
        SchemaId::Movies => MOVIES_SEED,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub table: &'static str,
    /// Column names, with ` PK` / ` FK` suffixes on keys.
    pub columns: &'static [&'static str],
    pub description: &'static str,
}

const EMPLOYEES_TABLES: &[TableInfo] = &[
    TableInfo {
        table: "departments",
        columns: &["id PK", "name", "location"],
        description: "Business groups across hubs",
    },
    TableInfo {
        table: "employees",
        columns: &[
            "id PK",
            "first_name",
            "last_name",
            "title",
            "department_id FK",
            "hire_date",
            "salary",
            "manager_id FK",
        ],
        description: "Org chart with salaries and managers",
    },
    TableInfo {
        table: "salaries",
        columns: &["id PK", "employee_id FK", "amount", "effective_date"],
        description: "Historical salary changes",
    },
];

const ECOMMERCE_TABLES: &[TableInfo] = &[
    TableInfo {
        table: "customers",
        columns: &["id PK", "name", "country", "signup_date", "vip"],
        description: "Shopper profiles and lifecycle",
    },
    TableInfo {
        table: "products",
        columns: &["id PK", "name", "category", "price"],
        description: "Catalog with categories",
    },
    TableInfo {
        table: "orders",
        columns: &["id PK", "customer_id FK", "order_date", "status"],
        description: "Order headers with status",
    },
    TableInfo {
        table: "order_items",
        columns: &["id PK", "order_id FK", "product_id FK", "quantity", "unit_price"],
        description: "Line items per order",
    },
];

const MOVIES_TABLES: &[TableInfo] = &[
    TableInfo {
        table: "movies",
        columns: &["id PK", "title", "released_year", "genre", "rating", "box_office"],
        description: "Film catalog with ratings and revenue",
    },
    TableInfo {
        table: "actors",
        columns: &["id PK", "name", "country"],
        description: "Cast roster",
    },
    TableInfo {
        table: "directors",
        columns: &["id PK", "name"],
        description: "Directors",
    },
    TableInfo {
        table: "movie_directors",
        columns: &["movie_id FK", "director_id FK"],
        description: "Many-to-many between movies and directors",
    },
    TableInfo {
        table: "roles",
        columns: &["movie_id FK", "actor_id FK", "role"],
        description: "Character names per actor/movie",
    },
];

pub fn tables(schema: SchemaId) -> &'static [TableInfo] {
    match schema {
        SchemaId::Employees => EMPLOYEES_TABLES,
        SchemaId::Ecommerce => ECOMMERCE_TABLES,
        SchemaId::Movies => MOVIES_TABLES,
    }
}
