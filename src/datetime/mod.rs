// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Calendar arithmetic, intervals and date formatting

pub mod calendar;
pub mod format;
pub mod interval;

pub use calendar::{calc_week, week, year_week};
pub use format::{format_duration, format_time, get_format, parse_with_format, shape, FormatShape};
pub use interval::{add_to_duration, add_to_time, Interval, IntervalUnit};
