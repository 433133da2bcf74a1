//! AST traversal that sorts table references into lineage roles.

use crate::error::ClassifyError;
use crate::types::{FunctionSignature, StatementLineage};
use sqlparser::ast::{
    AccessExpr, CeilFloorKind, DateTimeField, Expr, FromTable, Function, FunctionArg,
    FunctionArgExpr, FunctionArgumentClause, FunctionArguments, GroupByExpr, HavingBound,
    JoinConstraint, JoinOperator, LimitClause, NamedWindowDefinition, NamedWindowExpr, ObjectName,
    OrderByExpr, OrderByKind, Query, Select, SelectItem, SetExpr, Statement, Subscript,
    TableFactor, TableWithJoins, UpdateTableFromKind, WindowSpec, WindowType,
};
#[cfg(feature = "tracing")]
use tracing::debug;

/// Walks one statement and fills a [`StatementLineage`].
///
/// Table references found while walking are reads unless the statement
/// dispatch names them as a write or create target. CTE names are tracked
/// per query scope so references to them are not reported as tables.
pub(super) struct LineageWalker<'a> {
    lineage: &'a mut StatementLineage,
    cte_scopes: Vec<Vec<String>>,
    depth: usize,
    max_depth: usize,
}

impl<'a> LineageWalker<'a> {
    pub(super) fn new(lineage: &'a mut StatementLineage, max_depth: usize) -> Self {
        Self {
            lineage,
            cte_scopes: Vec::new(),
            depth: 0,
            max_depth,
        }
    }

    pub(super) fn statement(&mut self, statement: &Statement) -> Result<(), ClassifyError> {
        match statement {
            Statement::Query(query) => self.query(query),
            Statement::Insert(insert) => {
                self.lineage.add_write(insert.table.to_string());
                if let Some(source) = &insert.source {
                    self.query(source)?;
                }
                for assignment in &insert.assignments {
                    self.expr(&assignment.value)?;
                }
                Ok(())
            }
            Statement::Update {
                table,
                assignments,
                from,
                selection,
                ..
            } => {
                self.write_target(&table.relation)?;
                for join in &table.joins {
                    self.join_relation(&join.relation, &join.join_operator)?;
                }
                if let Some(UpdateTableFromKind::BeforeSet(tables) | UpdateTableFromKind::AfterSet(tables)) = from {
                    for table in tables {
                        self.table_with_joins(table)?;
                    }
                }
                for assignment in assignments {
                    self.expr(&assignment.value)?;
                }
                self.opt_expr(selection.as_ref())
            }
            Statement::Delete(delete) => {
                let from_tables = match &delete.from {
                    FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
                };
                if delete.tables.is_empty() {
                    // DELETE FROM target [JOIN ...]
                    for table in from_tables {
                        self.write_target(&table.relation)?;
                        for join in &table.joins {
                            self.join_relation(&join.relation, &join.join_operator)?;
                        }
                    }
                } else {
                    // Multi-table form: DELETE t1, t2 FROM t1 JOIN t2 ...
                    for name in &delete.tables {
                        self.lineage.add_write(name.to_string());
                    }
                    for table in from_tables {
                        self.table_with_joins_excluding(table, &delete.tables)?;
                    }
                }
                if let Some(using) = &delete.using {
                    for table in using {
                        self.table_with_joins(table)?;
                    }
                }
                self.opt_expr(delete.selection.as_ref())
            }
            Statement::Truncate { table_names, .. } => {
                for target in table_names {
                    self.lineage.add_write(target.name.to_string());
                }
                Ok(())
            }
            Statement::Call(function) => self.function(function),
            Statement::CreateTable(create) => {
                self.lineage.add_create(create.name.to_string());
                match &create.query {
                    Some(query) => self.query(query),
                    None => Ok(()),
                }
            }
            Statement::CreateView { name, query, .. } => {
                self.lineage.add_create(name.to_string());
                self.query(query)
            }
            _ => {
                #[cfg(feature = "tracing")]
                debug!(kind = %self.lineage.kind, "statement kind carries no lineage");
                Ok(())
            }
        }
    }

    fn query(&mut self, query: &Query) -> Result<(), ClassifyError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ClassifyError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }

        self.cte_scopes.push(Vec::new());
        let result = self.query_scope(query);
        self.cte_scopes.pop();
        self.depth -= 1;
        result
    }

    fn query_scope(&mut self, query: &Query) -> Result<(), ClassifyError> {
        if let Some(with) = &query.with {
            // A CTE body sees the CTEs declared before it, and itself only
            // under WITH RECURSIVE.
            for cte in &with.cte_tables {
                if with.recursive {
                    self.declare_cte(&cte.alias.name.value);
                    self.query(&cte.query)?;
                } else {
                    self.query(&cte.query)?;
                    self.declare_cte(&cte.alias.name.value);
                }
            }
        }
        self.set_expr(&query.body)?;

        if let Some(order_by) = &query.order_by {
            if let OrderByKind::Expressions(exprs) = &order_by.kind {
                self.order_by_exprs(exprs)?;
            }
        }
        match &query.limit_clause {
            Some(LimitClause::LimitOffset {
                limit,
                offset,
                limit_by,
            }) => {
                self.opt_expr(limit.as_ref())?;
                if let Some(offset) = offset {
                    self.expr(&offset.value)?;
                }
                self.exprs(limit_by)
            }
            Some(LimitClause::OffsetCommaLimit { offset, limit }) => {
                self.expr(offset)?;
                self.expr(limit)
            }
            None => Ok(()),
        }
    }

    fn declare_cte(&mut self, name: &str) {
        if let Some(scope) = self.cte_scopes.last_mut() {
            scope.push(name.to_string());
        }
    }

    fn set_expr(&mut self, body: &SetExpr) -> Result<(), ClassifyError> {
        match body {
            SetExpr::Select(select) => self.select(select),
            SetExpr::Query(query) => self.query(query),
            SetExpr::SetOperation { left, right, .. } => {
                self.set_expr(left)?;
                self.set_expr(right)
            }
            SetExpr::Values(values) => {
                for row in &values.rows {
                    for expr in row {
                        self.expr(expr)?;
                    }
                }
                Ok(())
            }
            SetExpr::Insert(statement)
            | SetExpr::Update(statement)
            | SetExpr::Delete(statement)
            | SetExpr::Merge(statement) => self.statement(statement),
            SetExpr::Table(table) => {
                if let Some(name) = &table.table_name {
                    let name = match &table.schema_name {
                        Some(schema) => format!("{schema}.{name}"),
                        None => name.clone(),
                    };
                    self.lineage.add_read(name);
                }
                Ok(())
            }
            #[allow(unreachable_patterns)]
            _ => Ok(()),
        }
    }

    fn select(&mut self, select: &Select) -> Result<(), ClassifyError> {
        for item in &select.projection {
            if let SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } = item {
                self.expr(expr)?;
            }
        }
        for table in &select.from {
            self.table_with_joins(table)?;
        }
        for view in &select.lateral_views {
            self.expr(&view.lateral_view)?;
        }
        self.opt_expr(select.prewhere.as_ref())?;
        self.opt_expr(select.selection.as_ref())?;
        if let GroupByExpr::Expressions(exprs, _) = &select.group_by {
            self.exprs(exprs)?;
        }
        self.exprs(&select.cluster_by)?;
        self.exprs(&select.distribute_by)?;
        self.order_by_exprs(&select.sort_by)?;
        self.opt_expr(select.having.as_ref())?;
        for NamedWindowDefinition(_, window) in &select.named_window {
            if let NamedWindowExpr::WindowSpec(spec) = window {
                self.window_spec(spec)?;
            }
        }
        self.opt_expr(select.qualify.as_ref())
    }

    fn table_with_joins(&mut self, table: &TableWithJoins) -> Result<(), ClassifyError> {
        self.table_factor(&table.relation)?;
        for join in &table.joins {
            self.join_relation(&join.relation, &join.join_operator)?;
        }
        Ok(())
    }

    /// Like [`Self::table_with_joins`], skipping relations that are already
    /// recorded as delete targets.
    fn table_with_joins_excluding(
        &mut self,
        table: &TableWithJoins,
        targets: &[ObjectName],
    ) -> Result<(), ClassifyError> {
        let relations = std::iter::once(&table.relation).chain(table.joins.iter().map(|j| &j.relation));
        for relation in relations {
            match relation {
                TableFactor::Table { name, .. } if targets.contains(name) => {}
                other => self.table_factor(other)?,
            }
        }
        for join in &table.joins {
            self.join_constraint(&join.join_operator)?;
        }
        Ok(())
    }

    fn join_relation(
        &mut self,
        relation: &TableFactor,
        operator: &JoinOperator,
    ) -> Result<(), ClassifyError> {
        self.table_factor(relation)?;
        self.join_constraint(operator)
    }

    fn join_constraint(&mut self, operator: &JoinOperator) -> Result<(), ClassifyError> {
        let constraint = match operator {
            JoinOperator::Join(c)
            | JoinOperator::Inner(c)
            | JoinOperator::Left(c)
            | JoinOperator::LeftOuter(c)
            | JoinOperator::Right(c)
            | JoinOperator::RightOuter(c)
            | JoinOperator::FullOuter(c)
            | JoinOperator::Semi(c)
            | JoinOperator::LeftSemi(c)
            | JoinOperator::RightSemi(c)
            | JoinOperator::Anti(c)
            | JoinOperator::LeftAnti(c)
            | JoinOperator::RightAnti(c) => c,
            JoinOperator::AsOf { constraint, .. } => constraint,
            _ => return Ok(()),
        };
        match constraint {
            JoinConstraint::On(expr) => self.expr(expr),
            _ => Ok(()),
        }
    }

    /// The primary target of a DML statement. Anything that is not a plain
    /// table name is walked for reads instead.
    fn write_target(&mut self, relation: &TableFactor) -> Result<(), ClassifyError> {
        match relation {
            TableFactor::Table { name, .. } => {
                self.lineage.add_write(name.to_string());
                Ok(())
            }
            other => self.table_factor(other),
        }
    }

    fn table_factor(&mut self, relation: &TableFactor) -> Result<(), ClassifyError> {
        match relation {
            TableFactor::Table {
                name,
                args: Some(args),
                ..
            } => {
                // Table-valued function in FROM position, e.g. generate_series(1, 10).
                self.record_function(name.to_string(), args.args.len());
                self.function_args(&args.args)
            }
            TableFactor::Table { name, .. } => {
                if !self.is_cte(name) {
                    self.lineage.add_read(name.to_string());
                }
                Ok(())
            }
            TableFactor::Derived { subquery, .. } => self.query(subquery),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.table_with_joins(table_with_joins),
            TableFactor::Pivot { table, .. }
            | TableFactor::Unpivot { table, .. }
            | TableFactor::MatchRecognize { table, .. } => self.table_factor(table),
            TableFactor::TableFunction { expr, .. } => self.expr(expr),
            TableFactor::Function { name, args, .. } => {
                self.record_function(name.to_string(), args.len());
                self.function_args(args)
            }
            TableFactor::UNNEST { array_exprs, .. } => {
                for expr in array_exprs {
                    self.expr(expr)?;
                }
                Ok(())
            }
            other => Err(ClassifyError::UnsupportedTableFactor(other.to_string())),
        }
    }

    fn is_cte(&self, name: &ObjectName) -> bool {
        let [part] = name.0.as_slice() else {
            return false;
        };
        let Some(ident) = part.as_ident() else {
            return false;
        };
        self.cte_scopes
            .iter()
            .flatten()
            .any(|cte| cte.eq_ignore_ascii_case(&ident.value))
    }

    fn opt_expr(&mut self, expr: Option<&Expr>) -> Result<(), ClassifyError> {
        match expr {
            Some(expr) => self.expr(expr),
            None => Ok(()),
        }
    }

    fn exprs(&mut self, exprs: &[Expr]) -> Result<(), ClassifyError> {
        exprs.iter().try_for_each(|expr| self.expr(expr))
    }

    fn order_by_exprs(&mut self, exprs: &[OrderByExpr]) -> Result<(), ClassifyError> {
        exprs.iter().try_for_each(|order_by| self.expr(&order_by.expr))
    }

    fn window_spec(&mut self, spec: &WindowSpec) -> Result<(), ClassifyError> {
        self.exprs(&spec.partition_by)?;
        self.order_by_exprs(&spec.order_by)
    }

    fn expr(&mut self, expr: &Expr) -> Result<(), ClassifyError> {
        match expr {
            Expr::Subquery(query) => self.query(query),
            Expr::InSubquery { expr, subquery, .. } => {
                self.expr(expr)?;
                self.query(subquery)
            }
            Expr::Exists { subquery, .. } => self.query(subquery),
            Expr::Function(function) => self.function(function),
            Expr::BinaryOp { left, right, .. }
            | Expr::AnyOp { left, right, .. }
            | Expr::AllOp { left, right, .. }
            | Expr::IsDistinctFrom(left, right)
            | Expr::IsNotDistinctFrom(left, right) => {
                self.expr(left)?;
                self.expr(right)
            }
            Expr::UnaryOp { expr, .. }
            | Expr::Nested(expr)
            | Expr::Cast { expr, .. }
            | Expr::Collate { expr, .. }
            | Expr::IsNull(expr)
            | Expr::IsNotNull(expr)
            | Expr::IsTrue(expr)
            | Expr::IsNotTrue(expr)
            | Expr::IsFalse(expr)
            | Expr::IsNotFalse(expr)
            | Expr::IsUnknown(expr)
            | Expr::IsNotUnknown(expr)
            | Expr::IsNormalized { expr, .. }
            | Expr::Named { expr, .. }
            | Expr::OuterJoin(expr)
            | Expr::Prior(expr) => self.expr(expr),
            Expr::Convert { expr, styles, .. } => {
                self.expr(expr)?;
                self.exprs(styles)
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                self.expr(expr)?;
                self.expr(low)?;
                self.expr(high)
            }
            Expr::Like { expr, pattern, .. }
            | Expr::ILike { expr, pattern, .. }
            | Expr::SimilarTo { expr, pattern, .. }
            | Expr::RLike { expr, pattern, .. } => {
                self.expr(expr)?;
                self.expr(pattern)
            }
            Expr::InList { expr, list, .. } => {
                self.expr(expr)?;
                self.exprs(list)
            }
            Expr::InUnnest {
                expr, array_expr, ..
            } => {
                self.expr(expr)?;
                self.expr(array_expr)
            }
            Expr::AtTimeZone {
                timestamp,
                time_zone,
            } => {
                self.expr(timestamp)?;
                self.expr(time_zone)
            }
            Expr::MemberOf(member) => {
                self.expr(&member.value)?;
                self.expr(&member.array)
            }
            Expr::CompoundFieldAccess { root, access_chain } => {
                self.expr(root)?;
                for access in access_chain {
                    match access {
                        AccessExpr::Dot(expr)
                        | AccessExpr::Subscript(Subscript::Index { index: expr }) => {
                            self.expr(expr)?
                        }
                        AccessExpr::Subscript(_) => {}
                    }
                }
                Ok(())
            }
            Expr::JsonAccess { value, .. } => self.expr(value),
            Expr::Tuple(items) | Expr::Struct { values: items, .. } => self.exprs(items),
            Expr::Array(array) => self.exprs(&array.elem),
            Expr::Map(map) => map.entries.iter().try_for_each(|entry| {
                self.expr(&entry.key)?;
                self.expr(&entry.value)
            }),
            Expr::Dictionary(fields) => fields.iter().try_for_each(|field| self.expr(&field.value)),
            Expr::GroupingSets(sets) | Expr::Cube(sets) | Expr::Rollup(sets) => {
                sets.iter().try_for_each(|set| self.exprs(set))
            }
            Expr::Interval(interval) => self.expr(&interval.value),
            Expr::Lambda(lambda) => self.expr(&lambda.body),
            Expr::Case {
                operand,
                conditions,
                else_result,
                ..
            } => {
                if let Some(operand) = operand {
                    self.expr(operand)?;
                }
                for when in conditions {
                    self.expr(&when.condition)?;
                    self.expr(&when.result)?;
                }
                match else_result {
                    Some(result) => self.expr(result),
                    None => Ok(()),
                }
            }
            // Built-ins with keyword syntax are their own AST nodes rather
            // than `Expr::Function`; record them under their keyword.
            Expr::Extract { expr, .. } => {
                self.record_function("EXTRACT".to_string(), 2);
                self.expr(expr)
            }
            Expr::Ceil { expr, field } => self.rounding("CEIL", expr, field),
            Expr::Floor { expr, field } => self.rounding("FLOOR", expr, field),
            Expr::Position { expr, r#in } => {
                self.record_function("POSITION".to_string(), 2);
                self.expr(expr)?;
                self.expr(r#in)
            }
            Expr::Substring {
                expr,
                substring_from,
                substring_for,
                ..
            } => {
                let operands = [substring_from, substring_for];
                let arg_count = 1 + operands.iter().filter(|op| op.is_some()).count();
                self.record_function("SUBSTRING".to_string(), arg_count);
                self.expr(expr)?;
                for operand in operands.into_iter().flatten() {
                    self.expr(operand)?;
                }
                Ok(())
            }
            Expr::Trim {
                expr,
                trim_what,
                trim_characters,
                ..
            } => {
                let arg_count = 1
                    + usize::from(trim_what.is_some())
                    + trim_characters.as_ref().map_or(0, Vec::len);
                self.record_function("TRIM".to_string(), arg_count);
                if let Some(what) = trim_what {
                    self.expr(what)?;
                }
                self.expr(expr)?;
                if let Some(characters) = trim_characters {
                    self.exprs(characters)?;
                }
                Ok(())
            }
            Expr::Overlay {
                expr,
                overlay_what,
                overlay_from,
                overlay_for,
            } => {
                let arg_count = 3 + usize::from(overlay_for.is_some());
                self.record_function("OVERLAY".to_string(), arg_count);
                self.expr(expr)?;
                self.expr(overlay_what)?;
                self.expr(overlay_from)?;
                match overlay_for {
                    Some(length) => self.expr(length),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    /// `CEIL(x)`, `CEIL(x TO DAY)`, `FLOOR(x, 2)`.
    fn rounding(
        &mut self,
        name: &str,
        expr: &Expr,
        field: &CeilFloorKind,
    ) -> Result<(), ClassifyError> {
        let arg_count = match field {
            CeilFloorKind::DateTimeField(DateTimeField::NoDateTime) => 1,
            _ => 2,
        };
        self.record_function(name.to_string(), arg_count);
        self.expr(expr)
    }

    fn function(&mut self, function: &Function) -> Result<(), ClassifyError> {
        let arg_count = match &function.args {
            FunctionArguments::None => 0,
            FunctionArguments::Subquery(_) => 1,
            FunctionArguments::List(list) => list.args.len(),
        };
        self.record_function(function.name.to_string(), arg_count);

        self.function_arguments(&function.parameters)?;
        self.function_arguments(&function.args)?;
        self.opt_expr(function.filter.as_deref())?;
        self.order_by_exprs(&function.within_group)?;
        match &function.over {
            Some(WindowType::WindowSpec(spec)) => self.window_spec(spec),
            _ => Ok(()),
        }
    }

    fn function_arguments(&mut self, arguments: &FunctionArguments) -> Result<(), ClassifyError> {
        match arguments {
            FunctionArguments::None => Ok(()),
            FunctionArguments::Subquery(query) => self.query(query),
            FunctionArguments::List(list) => {
                self.function_args(&list.args)?;
                for clause in &list.clauses {
                    match clause {
                        FunctionArgumentClause::OrderBy(exprs) => self.order_by_exprs(exprs)?,
                        FunctionArgumentClause::Limit(expr)
                        | FunctionArgumentClause::Having(HavingBound(_, expr)) => self.expr(expr)?,
                        _ => {}
                    }
                }
                Ok(())
            }
        }
    }

    /// Functions are lineage only for queries and CALL; elsewhere they are
    /// walked for the tables in their arguments and otherwise dropped.
    fn record_function(&mut self, name: String, arg_count: usize) {
        if self.lineage.kind.records_functions() {
            self.lineage
                .add_function(FunctionSignature::new(name, arg_count));
        }
    }

    fn function_args(&mut self, args: &[FunctionArg]) -> Result<(), ClassifyError> {
        for arg in args {
            let value = match arg {
                FunctionArg::Unnamed(value)
                | FunctionArg::Named { arg: value, .. }
                | FunctionArg::ExprNamed { arg: value, .. } => value,
            };
            if let FunctionArgExpr::Expr(expr) = value {
                self.expr(expr)?;
            }
        }
        Ok(())
    }
}
