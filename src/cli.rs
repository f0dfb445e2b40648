// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print output as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print output as JSON lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("splitledger")
        .about("Shared household expense tracking, classification, and partner settlement")
        .version(clap::crate_version!())
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the database and seed default categories"))
        .subcommand(
            Command::new("user")
                .about("Manage the two household partners")
                .subcommand(
                    Command::new("add")
                        .about("Add a household partner (at most two)")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("email").long("email").required(true)),
                )
                .subcommand(json_flags(Command::new("list").about("List household partners"))),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .about("Add an account")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("type").long("type").required(true))
                        .arg(Arg::new("currency").long("currency").required(true)),
                )
                .subcommand(Command::new("list").about("List accounts")),
        )
        .subcommand(
            Command::new("category")
                .about("Manage the category taxonomy")
                .subcommand(
                    Command::new("add")
                        .about("Add a category")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("parent").long("parent").help("Parent category name"))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .help("necessity|extra|investment|transfer (inherited if omitted)"),
                        )
                        .arg(
                            Arg::new("shared")
                                .long("shared")
                                .action(ArgAction::SetTrue)
                                .help("Expenses in this category default to shared"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list").about("List categories with effective types"),
                ))
                .subcommand(
                    Command::new("rm")
                        .about("Remove a category")
                        .arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Manage transactions")
                .subcommand(
                    Command::new("add")
                        .about("Record a transaction")
                        .arg(Arg::new("user").long("user").required(true))
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_negative_numbers(true)
                                .help("Signed amount; expenses are negative"),
                        )
                        .arg(Arg::new("description").long("description").required(true))
                        .arg(Arg::new("payee").long("payee"))
                        .arg(Arg::new("account").long("account"))
                        .arg(Arg::new("currency").long("currency"))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .help("Manual category (marks the transaction classified)"),
                        )
                        .arg(
                            Arg::new("shared")
                                .long("shared")
                                .action(ArgAction::SetTrue)
                                .help("Split this expense with the partner"),
                        )
                        .arg(
                            Arg::new("split")
                                .long("split")
                                .help("Owner's share percentage 0-100 (default 50)"),
                        )
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List transactions")
                        .arg(Arg::new("user").long("user"))
                        .arg(Arg::new("month").long("month").help("YYYY-MM"))
                        .arg(
                            Arg::new("unclassified")
                                .long("unclassified")
                                .action(ArgAction::SetTrue)
                                .help("Only transactions awaiting review"),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(
                    Command::new("set-category")
                        .about("Manually categorize a transaction (confidence 100)")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("category").long("category").required(true)),
                )
                .subcommand(
                    Command::new("share")
                        .about("Mark a transaction as shared")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(
                            Arg::new("split")
                                .long("split")
                                .help("Owner's share percentage 0-100"),
                        ),
                ),
        )
        .subcommand(
            Command::new("classify").about("Run the classifier").subcommand(json_flags(
                Command::new("run")
                    .about("Classify unreviewed transactions from history")
                    .arg(Arg::new("user").long("user").help("Restrict to one user")),
            )),
        )
        .subcommand(
            Command::new("balance")
                .about("Partner balances and settlement")
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List balance entries")
                        .arg(
                            Arg::new("all")
                                .long("all")
                                .action(ArgAction::SetTrue)
                                .help("Include settled entries"),
                        ),
                ))
                .subcommand(Command::new("net").about("Show who owes whom"))
                .subcommand(
                    Command::new("settle")
                        .about("Close all outstanding entries between the pair")
                        .arg(
                            Arg::new("date")
                                .long("date")
                                .help("Settlement date YYYY-MM-DD (default today)"),
                        ),
                ),
        )
}
