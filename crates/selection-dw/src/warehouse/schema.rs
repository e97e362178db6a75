use serde::Serialize;
use std::fmt;

/// Tables of the selection star schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    DimCandidate,
    DimDate,
    DimCountry,
    DimTechnology,
    DimSeniority,
    FactSelection,
}

impl TableName {
    /// Dimensions first so fact foreign keys always have a target.
    pub const fn load_order() -> [Self; 6] {
        [
            Self::DimCandidate,
            Self::DimDate,
            Self::DimCountry,
            Self::DimTechnology,
            Self::DimSeniority,
            Self::FactSelection,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DimCandidate => "dim_candidate",
            Self::DimDate => "dim_date",
            Self::DimCountry => "dim_country",
            Self::DimTechnology => "dim_technology",
            Self::DimSeniority => "dim_seniority",
            Self::FactSelection => "fact_selection",
        }
    }

    pub fn schema(self) -> &'static TableSchema {
        match self {
            Self::DimCandidate => &DIM_CANDIDATE,
            Self::DimDate => &DIM_DATE,
            Self::DimCountry => &DIM_COUNTRY,
            Self::DimTechnology => &DIM_TECHNOLOGY,
            Self::DimSeniority => &DIM_SENIORITY,
            Self::FactSelection => &FACT_SELECTION,
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    SmallInteger,
    Text,
    Date,
}

impl ColumnType {
    const fn sql(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::SmallInteger => "TINYINT",
            Self::Text => "VARCHAR(150)",
            Self::Date => "DATE",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnType,
    pub references: Option<TableName>,
}

const fn column(name: &'static str, kind: ColumnType) -> ColumnDef {
    ColumnDef {
        name,
        kind,
        references: None,
    }
}

const fn foreign_key(name: &'static str, target: TableName) -> ColumnDef {
    ColumnDef {
        name,
        kind: ColumnType::Integer,
        references: Some(target),
    }
}

/// Fixed physical layout of one warehouse table. The first column is the
/// surrogate primary key.
#[derive(Debug)]
pub struct TableSchema {
    pub table: TableName,
    pub columns: &'static [ColumnDef],
}

impl TableSchema {
    pub fn primary_key(&self) -> &'static str {
        self.columns[0].name
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|column| column.name)
    }

    pub fn create_statement(&self) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(self.columns.len() + 4);
        lines.push(format!("{} INTEGER PRIMARY KEY", self.primary_key()));
        for column in &self.columns[1..] {
            lines.push(format!("{} {}", column.name, column.kind.sql()));
        }
        for column in self.columns {
            if let Some(target) = column.references {
                lines.push(format!(
                    "FOREIGN KEY({}) REFERENCES {}({})",
                    column.name,
                    target,
                    target.schema().primary_key()
                ));
            }
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.table,
            lines.join(",\n    ")
        )
    }

    pub fn insert_statement(&self) -> String {
        let columns = self.column_names().collect::<Vec<_>>();
        let placeholders = (1..=columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders.join(", ")
        )
    }

    pub fn drop_statement(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.table)
    }
}

pub static DIM_CANDIDATE: TableSchema = TableSchema {
    table: TableName::DimCandidate,
    columns: &[
        column("candidate_id", ColumnType::Integer),
        column("first_name", ColumnType::Text),
        column("last_name", ColumnType::Text),
        column("email", ColumnType::Text),
        column("yoe", ColumnType::Integer),
    ],
};

pub static DIM_DATE: TableSchema = TableSchema {
    table: TableName::DimDate,
    columns: &[
        column("date_id", ColumnType::Integer),
        column("year", ColumnType::Integer),
        column("month", ColumnType::Integer),
        column("day", ColumnType::Integer),
        column("full_date", ColumnType::Date),
    ],
};

pub static DIM_COUNTRY: TableSchema = TableSchema {
    table: TableName::DimCountry,
    columns: &[
        column("country_id", ColumnType::Integer),
        column("country_name", ColumnType::Text),
    ],
};

pub static DIM_TECHNOLOGY: TableSchema = TableSchema {
    table: TableName::DimTechnology,
    columns: &[
        column("technology_id", ColumnType::Integer),
        column("technology_name", ColumnType::Text),
    ],
};

pub static DIM_SENIORITY: TableSchema = TableSchema {
    table: TableName::DimSeniority,
    columns: &[
        column("seniority_id", ColumnType::Integer),
        column("seniority_name", ColumnType::Text),
    ],
};

pub static FACT_SELECTION: TableSchema = TableSchema {
    table: TableName::FactSelection,
    columns: &[
        column("selection_id", ColumnType::Integer),
        foreign_key("candidate_id", TableName::DimCandidate),
        foreign_key("date_id", TableName::DimDate),
        foreign_key("country_id", TableName::DimCountry),
        foreign_key("technology_id", TableName::DimTechnology),
        foreign_key("seniority_id", TableName::DimSeniority),
        column("code_challenge_score", ColumnType::Integer),
        column("technical_interview_score", ColumnType::Integer),
        column("hired", ColumnType::SmallInteger),
    ],
};

/// A source column of the raw candidate export and where it lands in the
/// warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub raw: &'static str,
    pub table: TableName,
    pub column: &'static str,
}

pub const FIRST_NAME: ColumnMapping = mapping("First Name", TableName::DimCandidate, "first_name");
pub const LAST_NAME: ColumnMapping = mapping("Last Name", TableName::DimCandidate, "last_name");
pub const EMAIL: ColumnMapping = mapping("Email", TableName::DimCandidate, "email");
pub const YOE: ColumnMapping = mapping("YOE", TableName::DimCandidate, "yoe");
pub const APPLICATION_DATE: ColumnMapping =
    mapping("Application Date", TableName::DimDate, "full_date");
pub const COUNTRY: ColumnMapping = mapping("Country", TableName::DimCountry, "country_name");
pub const TECHNOLOGY: ColumnMapping =
    mapping("Technology", TableName::DimTechnology, "technology_name");
pub const SENIORITY: ColumnMapping =
    mapping("Seniority", TableName::DimSeniority, "seniority_name");
pub const CODE_CHALLENGE_SCORE: ColumnMapping = mapping(
    "Code Challenge Score",
    TableName::FactSelection,
    "code_challenge_score",
);
pub const TECHNICAL_INTERVIEW_SCORE: ColumnMapping = mapping(
    "Technical Interview Score",
    TableName::FactSelection,
    "technical_interview_score",
);

/// Every raw column the extractor requires, in export order.
pub const RAW_COLUMNS: [ColumnMapping; 10] = [
    FIRST_NAME,
    LAST_NAME,
    EMAIL,
    APPLICATION_DATE,
    COUNTRY,
    YOE,
    SENIORITY,
    TECHNOLOGY,
    CODE_CHALLENGE_SCORE,
    TECHNICAL_INTERVIEW_SCORE,
];

const fn mapping(raw: &'static str, table: TableName, column: &'static str) -> ColumnMapping {
    ColumnMapping { raw, table, column }
}
