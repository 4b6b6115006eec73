use crate::element;
use crate::smiles::error::SmilesError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Atom(AtomToken),
    Bond(BondToken, usize),
    RingClosure {
        bond: Option<BondToken>,
        digit: u16,
        pos: usize,
    },
    OpenParen(usize),
    CloseParen(usize),
    Dot(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomToken {
    pub atomic_num: u8,
    pub is_aromatic: bool,
    pub isotope: u16,
    pub chirality: ChiralityToken,
    /// `Some` only for bracket atoms.
    pub hcount: Option<u8>,
    pub charge: i8,
    pub atom_class: u16,
    pub pos: usize,
}

impl AtomToken {
    pub fn is_bracket(&self) -> bool {
        self.hcount.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChiralityToken {
    None,
    CounterClockwise,
    Clockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondToken {
    Single,
    Double,
    Triple,
    Aromatic,
    Up,
    Down,
}

impl BondToken {
    pub fn is_directional(self) -> bool {
        matches!(self, BondToken::Up | BondToken::Down)
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, SmilesError> {
    Lexer::new(input).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn run(mut self) -> Result<Vec<Token>, SmilesError> {
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                '[' => {
                    let atom = self.bracket_atom()?;
                    self.tokens.push(Token::Atom(atom));
                }
                'B' | 'C' | 'N' | 'O' | 'P' | 'S' | 'F' | 'I' => {
                    let atomic_num = match (c, self.peek_at(1)) {
                        ('B', Some('r')) => 35,
                        ('C', Some('l')) => 17,
                        _ => element::from_symbol(&c.to_string()).unwrap_or(0),
                    };
                    self.pos += if matches!(atomic_num, 35 | 17) { 2 } else { 1 };
                    self.tokens
                        .push(Token::Atom(bare_atom(atomic_num, false, start)));
                }
                'b' | 'c' | 'n' | 'o' | 'p' | 's' => {
                    let upper = c.to_ascii_uppercase().to_string();
                    let atomic_num = element::from_symbol(&upper).unwrap_or(0);
                    self.pos += 1;
                    self.tokens.push(Token::Atom(bare_atom(atomic_num, true, start)));
                }
                '-' | '=' | '#' | ':' | '/' | '\\' => {
                    let bond = match c {
                        '-' => BondToken::Single,
                        '=' => BondToken::Double,
                        '#' => BondToken::Triple,
                        ':' => BondToken::Aromatic,
                        '/' => BondToken::Up,
                        _ => BondToken::Down,
                    };
                    if matches!(self.tokens.last(), Some(Token::Bond(..))) {
                        return Err(SmilesError::UnexpectedChar { pos: start, ch: c });
                    }
                    self.pos += 1;
                    self.tokens.push(Token::Bond(bond, start));
                }
                '(' => {
                    self.pos += 1;
                    self.tokens.push(Token::OpenParen(start));
                }
                ')' => {
                    self.pos += 1;
                    self.tokens.push(Token::CloseParen(start));
                }
                '.' => {
                    self.pos += 1;
                    self.tokens.push(Token::Dot(start));
                }
                '%' => {
                    let digit = match (self.peek_at(1), self.peek_at(2)) {
                        (Some(a), Some(b)) if a.is_ascii_digit() && b.is_ascii_digit() => {
                            digit_value(a) * 10 + digit_value(b)
                        }
                        _ => return Err(SmilesError::UnexpectedChar { pos: start, ch: '%' }),
                    };
                    self.pos += 3;
                    self.ring_closure(digit, start);
                }
                d if d.is_ascii_digit() => {
                    self.pos += 1;
                    self.ring_closure(digit_value(d), start);
                }
                ch => return Err(SmilesError::UnexpectedChar { pos: start, ch }),
            }
        }
        if self.tokens.is_empty() {
            return Err(SmilesError::EmptyInput);
        }
        Ok(self.tokens)
    }

    /// A bond symbol written right before a ring digit belongs to the ring
    /// bond.
    fn ring_closure(&mut self, digit: u16, pos: usize) {
        let bond = match self.tokens.last() {
            Some(Token::Bond(b, _)) => {
                let b = *b;
                self.tokens.pop();
                Some(b)
            }
            _ => None,
        };
        self.tokens.push(Token::RingClosure { bond, digit, pos });
    }

    fn bracket_atom(&mut self) -> Result<AtomToken, SmilesError> {
        let start = self.pos;
        self.pos += 1;

        let isotope = self.number(start, |pos| SmilesError::InvalidIsotope { pos })?;
        let (atomic_num, is_aromatic) = self.bracket_element(start)?;

        let chirality = if self.eat('@') {
            if self.eat('@') {
                ChiralityToken::Clockwise
            } else {
                ChiralityToken::CounterClockwise
            }
        } else {
            ChiralityToken::None
        };

        let hcount = if self.eat('H') {
            match self.peek() {
                Some(d) if d.is_ascii_digit() => {
                    self.pos += 1;
                    digit_value(d) as u8
                }
                _ => 1,
            }
        } else {
            0
        };

        let charge = self.charge(start)?;

        let atom_class = if self.eat(':') {
            self.number(start, |pos| SmilesError::InvalidAtomClass { pos })?
        } else {
            0
        };

        if !self.eat(']') {
            return Err(SmilesError::UnclosedBracket { pos: start });
        }

        Ok(AtomToken {
            atomic_num,
            is_aromatic,
            isotope,
            chirality,
            hcount: Some(hcount),
            charge,
            atom_class,
            pos: start,
        })
    }

    fn number(
        &mut self,
        start: usize,
        overflow: impl Fn(usize) -> SmilesError,
    ) -> Result<u16, SmilesError> {
        let mut val: u16 = 0;
        while let Some(d) = self.peek().filter(char::is_ascii_digit) {
            val = val
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit_value(d)))
                .ok_or_else(|| overflow(start))?;
            self.pos += 1;
        }
        Ok(val)
    }

    fn bracket_element(&mut self, start: usize) -> Result<(u8, bool), SmilesError> {
        let first = self
            .peek()
            .ok_or(SmilesError::UnclosedBracket { pos: start })?;

        if first.is_ascii_lowercase() {
            // two-letter aromatic symbols first
            for (pat, num) in [("se", 34u8), ("te", 52), ("as", 33)] {
                let mut chars = pat.chars();
                if chars.next() == Some(first) && chars.next() == self.peek_at(1) {
                    self.pos += 2;
                    return Ok((num, true));
                }
            }
            let num = element::from_symbol(&first.to_ascii_uppercase().to_string())
                .filter(|&n| element::aromatic_symbol_allowed(n))
                .ok_or_else(|| SmilesError::InvalidElement {
                    pos: self.pos,
                    text: first.to_string(),
                })?;
            self.pos += 1;
            return Ok((num, true));
        }

        if let Some(second) = self.peek_at(1).filter(char::is_ascii_lowercase) {
            let sym: String = [first, second].iter().collect();
            if let Some(num) = element::from_symbol(&sym) {
                self.pos += 2;
                return Ok((num, false));
            }
        }
        match element::from_symbol(&first.to_string()) {
            Some(num) => {
                self.pos += 1;
                Ok((num, false))
            }
            None => Err(SmilesError::InvalidElement {
                pos: self.pos,
                text: first.to_string(),
            }),
        }
    }

    fn charge(&mut self, start: usize) -> Result<i8, SmilesError> {
        let sign: i8 = match self.peek() {
            Some('+') => 1,
            Some('-') => -1,
            _ => return Ok(0),
        };
        let symbol = if sign > 0 { '+' } else { '-' };
        self.pos += 1;

        if let Some(d) = self.peek().filter(char::is_ascii_digit) {
            self.pos += 1;
            let mut val = digit_value(d) as i8;
            if let Some(d2) = self.peek().filter(char::is_ascii_digit) {
                self.pos += 1;
                val = val
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(digit_value(d2) as i8))
                    .ok_or(SmilesError::InvalidCharge { pos: start })?;
            }
            return Ok(sign * val);
        }

        let mut count: i8 = 1;
        while self.eat(symbol) {
            count = count
                .checked_add(1)
                .ok_or(SmilesError::InvalidCharge { pos: start })?;
        }
        Ok(sign * count)
    }
}

fn digit_value(c: char) -> u16 {
    (c as u16).wrapping_sub('0' as u16)
}

fn bare_atom(atomic_num: u8, is_aromatic: bool, pos: usize) -> AtomToken {
    AtomToken {
        atomic_num,
        is_aromatic,
        isotope: 0,
        chirality: ChiralityToken::None,
        hcount: None,
        charge: 0,
        atom_class: 0,
        pos,
    }
}
